use std::path::PathBuf;

use stage2d::{Level, LoopConfig, SceneConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::layout::load_layout;
use super::level::DemoLevel;

const SCENE_CONFIG_ENV_VAR: &str = "STAGE2D_SCENE_CONFIG";
const LEVEL_LAYOUT_ENV_VAR: &str = "STAGE2D_LEVEL";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) level: Box<dyn Level>,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== stage2d demo startup ===");

    let scene = match env_path(SCENE_CONFIG_ENV_VAR) {
        Some(path) => {
            info!(path = %path.display(), "scene_config_override");
            SceneConfig::from_path(&path).map_err(|error| error.to_string())?
        }
        None => SceneConfig::default(),
    };
    let layout_path = env_path(LEVEL_LAYOUT_ENV_VAR);
    let layout = load_layout(layout_path.as_deref())?;
    info!(
        actors = layout.actors.len(),
        custom = layout_path.is_some(),
        "level_layout_loaded"
    );

    let config = LoopConfig {
        window_title: "stage2d demo".to_string(),
        window_width: scene.screen_width,
        window_height: scene.screen_height,
        scene,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        level: Box::new(DemoLevel::new(layout)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
