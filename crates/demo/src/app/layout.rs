use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use stage2d::{Animation, BodyShape, BodyType, Vec2};

pub(crate) const DEFAULT_LAYOUT_JSON: &str = include_str!("default_layout.json");

pub(crate) type LayoutResult<T> = Result<T, String>;

/// Actors are listed in body-creation order, which is also point-query priority.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelLayout {
    pub(crate) actors: Vec<ActorLayout>,
    #[serde(default)]
    pub(crate) reroll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ActorLayout {
    pub(crate) name: String,
    pub(crate) shape: BodyShape,
    /// Top-left corner in world meters.
    pub(crate) position: Vec2,
    pub(crate) image: String,
    #[serde(default)]
    pub(crate) z: i32,
    #[serde(default)]
    pub(crate) body_type: BodyType,
    #[serde(default)]
    pub(crate) angle: f32,
    #[serde(default)]
    pub(crate) route: Option<RouteLayout>,
    #[serde(default)]
    pub(crate) animation: Option<Animation>,
    #[serde(default)]
    pub(crate) alternatives: Vec<String>,
    #[serde(default)]
    pub(crate) behaviors: Vec<Behavior>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RouteLayout {
    pub(crate) waypoints: Vec<Vec2>,
    pub(crate) speed: f32,
    #[serde(default)]
    pub(crate) looping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Behavior {
    RerollOnTap,
    ToggleRouteOnSwipe,
    PanCamera,
}

pub(crate) fn load_layout(path: Option<&Path>) -> LayoutResult<LevelLayout> {
    let Some(path) = path else {
        return parse_layout_json(DEFAULT_LAYOUT_JSON);
    };
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read layout '{}': {error}", path.display()))?;
    parse_layout_json(&raw)
}

pub(crate) fn parse_layout_json(raw: &str) -> LayoutResult<LevelLayout> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let layout = match serde_path_to_error::deserialize::<_, LevelLayout>(&mut deserializer) {
        Ok(layout) => layout,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return if path.is_empty() || path == "." {
                Err(format!("parse layout json: {source}"))
            } else {
                Err(format!("parse layout json at {path}: {source}"))
            };
        }
    };
    validate_layout(&layout)?;
    Ok(layout)
}

fn validate_layout(layout: &LevelLayout) -> LayoutResult<()> {
    if layout.actors.is_empty() {
        return Err(validation_err("actors", "expected at least one actor"));
    }
    let mut seen = HashSet::new();
    for (index, actor) in layout.actors.iter().enumerate() {
        if !seen.insert(actor.name.as_str()) {
            return Err(validation_err(
                &format!("actors[{index}].name"),
                format!("duplicate actor name '{}'", actor.name),
            ));
        }
        if let Some(route) = &actor.route {
            if !route.speed.is_finite() || route.speed <= 0.0 {
                return Err(validation_err(
                    &format!("actors[{index}].route.speed"),
                    format!("expected a positive speed, got {}", route.speed),
                ));
            }
        }
    }
    if layout.reroll_interval_ms == Some(0) {
        return Err(validation_err("reroll_interval_ms", "must be non-zero"));
    }
    Ok(())
}

fn validation_err(path: &str, message: impl Into<String>) -> String {
    format!("validation failed at {path}: {}", message.into())
}
