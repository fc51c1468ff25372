mod input;
mod loop_runner;
mod rendering;
mod scene;
mod typewriter;
mod virtual_pad;

pub use input::{InputAction, InputState};
pub use loop_runner::{run_app, AppError, LoopConfig, MAX_FPS_ENV_VAR, SHOW_HITBOXES_ENV_VAR};
pub use rendering::Renderer;
pub use scene::{
    DialogView, Facing, InputSnapshot, MarkerView, PlayerView, Scene, SceneCommand, SceneWorld,
};
pub use typewriter::{CancelToken, RevealProgress, TextReveal};
pub use virtual_pad::{VirtualButton, VirtualPad};
