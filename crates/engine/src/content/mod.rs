mod dialogs;
mod error;
mod image_ref;
mod layout;
mod pipeline;
mod scene_file;

pub use dialogs::{load_dialog_table, parse_dialog_table, DialogContent, DialogTable};
pub use error::{ContentErrorCode, ContentLoadError, SourceLocation};
pub use image_ref::{resolve_image_path, ImageRefError};
pub use layout::{
    Marker, MarkerId, PlayerRecord, PlayerSpawn, RecordKind, SceneLayout, SceneLayoutError,
    SceneRecord, MAX_PLAYER_SPEED,
};
pub use pipeline::{load_scene_content, SceneContent};
pub use scene_file::{load_scene_layout, parse_scene_layout};
