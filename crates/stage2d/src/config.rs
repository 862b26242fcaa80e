use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{Vec2, Verbosity, Viewport};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scene config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid scene config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Fixed physics step taken once per tick, independent of elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsStepConfig {
    pub step_seconds: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
}

impl Default for PhysicsStepConfig {
    fn default() -> Self {
        Self {
            step_seconds: 1.0 / 45.0,
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// World extent in meters; the world always starts at the origin.
    pub world_size: Vec2,
    pub screen_width: u32,
    pub screen_height: u32,
    pub pixels_per_meter: f32,
    pub physics: PhysicsStepConfig,
    pub gravity: Vec2,
    /// Draws an outline over every visible actor's body shape.
    pub debug_shapes: bool,
    pub verbosity: Verbosity,
    pub rng_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            world_size: Vec2::new(64.0, 48.0),
            screen_width: 960,
            screen_height: 640,
            pixels_per_meter: 20.0,
            physics: PhysicsStepConfig::default(),
            gravity: Vec2::ZERO,
            debug_shapes: false,
            verbosity: Verbosity::All,
            rng_seed: None,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.screen_width,
            height: self.screen_height,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(invalid("screen", "must be non-zero"));
        }
        if !is_positive(self.world_size.x) || !is_positive(self.world_size.y) {
            return Err(invalid("world_size", "must be positive and finite"));
        }
        if !is_positive(self.pixels_per_meter) {
            return Err(invalid("pixels_per_meter", "must be positive and finite"));
        }
        if !is_positive(self.physics.step_seconds) {
            return Err(invalid("physics.step_seconds", "must be positive and finite"));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SceneConfig::from_json_str("{}").expect("parse");
        assert_eq!(config, SceneConfig::default());
        assert!((config.physics.step_seconds - 1.0 / 45.0).abs() < 1e-6);
        assert_eq!(config.physics.velocity_iterations, 8);
        assert_eq!(config.physics.position_iterations, 3);
    }

    #[test]
    fn partial_fields_override_defaults() {
        let config = SceneConfig::from_json_str(
            r#"{
                "world_size": { "x": 10.0, "y": 8.0 },
                "pixels_per_meter": 32.0,
                "physics": { "velocity_iterations": 4 },
                "verbosity": "urgent",
                "rng_seed": 7
            }"#,
        )
        .expect("parse");

        assert_eq!(config.world_size, Vec2::new(10.0, 8.0));
        assert_eq!(config.pixels_per_meter, 32.0);
        assert_eq!(config.physics.velocity_iterations, 4);
        assert_eq!(config.physics.position_iterations, 3);
        assert_eq!(config.verbosity, Verbosity::Urgent);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.screen_width, 960);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = SceneConfig::from_json_str(r#"{ "zoom": 2.0 }"#).expect_err("unknown field");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn non_positive_scale_is_invalid() {
        let error =
            SceneConfig::from_json_str(r#"{ "pixels_per_meter": 0.0 }"#).expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "pixels_per_meter",
                ..
            }
        ));
    }

    #[test]
    fn from_path_reads_file_and_reports_missing_file() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("scene.json");
        fs::write(&path, r#"{ "screen_width": 320, "screen_height": 200 }"#).expect("write");

        let config = SceneConfig::from_path(&path).expect("config");
        assert_eq!(
            config.viewport(),
            Viewport {
                width: 320,
                height: 200
            }
        );

        let missing = SceneConfig::from_path(&temp.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
