use std::sync::Arc;

use tracing::{info, warn};

use crate::AppPaths;

use super::dialogs::{load_dialog_table, DialogTable};
use super::error::ContentLoadError;
use super::layout::SceneLayout;
use super::scene_file::load_scene_layout;

/// Read-only content shared by the scene for the whole session.
#[derive(Debug, Clone)]
pub struct SceneContent {
    pub layout: Arc<SceneLayout>,
    pub dialogs: Arc<DialogTable>,
}

pub fn load_scene_content(app_paths: &AppPaths) -> Result<SceneContent, ContentLoadError> {
    let layout = load_scene_layout(&app_paths.scene_file)?;
    let dialogs = load_dialog_table(&app_paths.dialogs_file)?;

    for marker in layout.markers() {
        if dialogs.lookup(&marker.id).is_none() {
            warn!(
                marker_id = %marker.id,
                dialogs_file = %app_paths.dialogs_file.display(),
                "marker_has_no_dialog_content"
            );
        }
    }

    info!(
        scene_file = %app_paths.scene_file.display(),
        width = layout.width(),
        height = layout.height(),
        obstacle_count = layout.obstacles().len(),
        marker_count = layout.markers().len(),
        dialog_count = dialogs.len(),
        "scene_content_loaded"
    );

    Ok(SceneContent {
        layout: Arc::new(layout),
        dialogs: Arc::new(dialogs),
    })
}
