use std::path::PathBuf;

use roam_engine::{
    load_scene_content, resolve_app_paths, ContentLoadError, LoopConfig, Scene, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) asset_root: PathBuf,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentLoadError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Roam Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(root = %app_paths.root.display(), "app_paths_resolved");

    let content = load_scene_content(&app_paths)?;

    let config = LoopConfig::default().with_env_overrides();
    let scene = gameplay::build_scene(content, config.text_reveal_delay);

    Ok(AppWiring {
        config,
        scene,
        asset_root: app_paths.assets_dir.join("base"),
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
