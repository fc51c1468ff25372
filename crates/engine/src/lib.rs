use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod geometry;

pub use app::{
    run_app, AppError, CancelToken, DialogView, Facing, InputAction, InputSnapshot, InputState,
    LoopConfig, MarkerView, PlayerView, RevealProgress, Scene, SceneCommand, SceneWorld,
    TextReveal, VirtualButton, VirtualPad, MAX_FPS_ENV_VAR, SHOW_HITBOXES_ENV_VAR,
};
pub use content::{
    load_dialog_table, load_scene_content, load_scene_layout, parse_dialog_table,
    parse_scene_layout, resolve_image_path, ContentErrorCode, ContentLoadError, DialogContent,
    DialogTable, ImageRefError, Marker, MarkerId, PlayerRecord, PlayerSpawn, RecordKind,
    SceneContent, SceneLayout, SceneLayoutError, SceneRecord, SourceLocation, MAX_PLAYER_SPEED,
};
pub use geometry::{intersects, is_near, Rect};

pub const ROOT_ENV_VAR: &str = "ROAM_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub scene_file: PathBuf,
    pub dialogs_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "ROAM_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain an assets/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/roam\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let assets_dir = root.join("assets");
    let base_dir = assets_dir.join("base");
    AppPaths {
        scene_file: base_dir.join("scene.xml"),
        dialogs_file: base_dir.join("dialogs.json"),
        assets_dir,
        root,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("assets").join("base").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_assets_base() {
        let temp = tempfile::TempDir::new().expect("temp");
        assert!(!is_repo_marker(temp.path()));
        fs::create_dir_all(temp.path().join("assets").join("base")).expect("mkdir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_point_into_assets_base() {
        let paths = app_paths_for_root(PathBuf::from("/srv/roam"));
        assert_eq!(paths.assets_dir, PathBuf::from("/srv/roam/assets"));
        assert_eq!(
            paths.scene_file,
            PathBuf::from("/srv/roam/assets/base/scene.xml")
        );
        assert_eq!(
            paths.dialogs_file,
            PathBuf::from("/srv/roam/assets/base/dialogs.json")
        );
    }

    #[test]
    fn shipped_assets_load() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
        let content = load_scene_content(&app_paths_for_root(root)).expect("shipped content");
        assert_eq!(content.layout.markers().len(), 4);
        for marker in content.layout.markers() {
            assert!(
                content.dialogs.lookup(&marker.id).is_some(),
                "marker {} has no dialog",
                marker.id
            );
        }
    }
}
