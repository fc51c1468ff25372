use std::time::Duration;

use super::input::{InputAction, InputState};
use crate::content::MarkerId;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Stop any virtual-pad auto-repeat and release the held action.
    ReleaseHeldButtons,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: InputState,
    dismiss_pressed: bool,
    frame_dt: Duration,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(actions: InputState, dismiss_pressed: bool, frame_dt: Duration) -> Self {
        Self {
            actions,
            dismiss_pressed,
            frame_dt,
        }
    }

    pub fn actions(&self) -> &InputState {
        &self.actions
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True on the tick after any fresh key press or primary click.
    pub fn dismiss_pressed(&self) -> bool {
        self.dismiss_pressed
    }

    pub fn frame_dt(&self) -> Duration {
        self.frame_dt
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_dismiss_pressed(mut self, dismiss_pressed: bool) -> Self {
        self.dismiss_pressed = dismiss_pressed;
        self
    }

    pub fn with_frame_dt(mut self, frame_dt: Duration) -> Self {
        self.frame_dt = frame_dt;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    pub rect: Rect,
    pub facing: Facing,
    pub moving: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerView {
    pub id: MarkerId,
    pub rect: Rect,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogView {
    pub title: String,
    /// The part of the body revealed so far.
    pub body: String,
    pub image_ref: String,
}

/// Render signals for one frame. The scene writes it during `update`; the
/// renderer only reads it.
#[derive(Debug, Clone)]
pub struct SceneWorld {
    width: u32,
    height: u32,
    obstacles: Vec<Rect>,
    markers: Vec<MarkerView>,
    player: PlayerView,
    prompt: String,
    dialog: Option<DialogView>,
    show_hitboxes: bool,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            obstacles: Vec::new(),
            markers: Vec::new(),
            player: PlayerView {
                rect: Rect::default(),
                facing: Facing::default(),
                moving: false,
            },
            prompt: String::new(),
            dialog: None,
            show_hitboxes: false,
        }
    }
}

impl SceneWorld {
    pub fn with_show_hitboxes(mut self, show_hitboxes: bool) -> Self {
        self.show_hitboxes = show_hitboxes;
        self
    }

    pub fn set_layout(
        &mut self,
        width: u32,
        height: u32,
        obstacles: Vec<Rect>,
        markers: impl IntoIterator<Item = (MarkerId, Rect)>,
    ) {
        self.width = width;
        self.height = height;
        self.obstacles = obstacles;
        self.markers = markers
            .into_iter()
            .map(|(id, rect)| MarkerView {
                id,
                rect,
                highlighted: false,
            })
            .collect();
    }

    /// Flags beyond the marker count are ignored; missing flags clear.
    pub fn set_marker_highlights(&mut self, highlights: &[bool]) {
        for (index, marker) in self.markers.iter_mut().enumerate() {
            marker.highlighted = highlights.get(index).copied().unwrap_or(false);
        }
    }

    pub fn set_player(&mut self, player: PlayerView) {
        self.player = player;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn open_dialog(&mut self, dialog: DialogView) {
        self.dialog = Some(dialog);
    }

    pub fn close_dialog(&mut self) -> Option<DialogView> {
        self.dialog.take()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut DialogView> {
        self.dialog.as_mut()
    }

    pub fn clear(&mut self) {
        let show_hitboxes = self.show_hitboxes;
        *self = Self::default().with_show_hitboxes(show_hitboxes);
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn markers(&self) -> &[MarkerView] {
        &self.markers
    }

    pub fn player(&self) -> &PlayerView {
        &self.player
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn dialog(&self) -> Option<&DialogView> {
        self.dialog.as_ref()
    }

    pub fn show_hitboxes(&self) -> bool {
        self.show_hitboxes
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(&mut self, input: &InputSnapshot, world: &mut SceneWorld) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>, world: SceneWorld) -> Self {
        Self {
            scene,
            world,
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            return SceneCommand::None;
        }
        self.scene.update(input, &mut self.world)
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}
