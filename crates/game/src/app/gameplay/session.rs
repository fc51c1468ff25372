use std::fmt;
use std::sync::Arc;

use roam_engine::{DialogContent, DialogTable, InputAction, InputState, MarkerId, SceneLayout};
use tracing::{info, warn};

use super::interaction::{detect, InteractionReport};
use super::movement::{resolve_move, PlayerState};

pub(crate) const NEAR_MARGIN_PX: u32 = 2;
pub(crate) const EXPLORE_PROMPT: &str = "Explore!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionPhase {
    Exploring,
    DialogOpen { marker_id: MarkerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Prompt {
    Idle,
    ActivateNear(MarkerId),
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Idle => f.write_str(EXPLORE_PROMPT),
            Prompt::ActivateNear(id) => write!(f, "Press F to show \"{id}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    DialogOpened {
        marker_id: MarkerId,
        content: DialogContent,
    },
    DialogClosed {
        marker_id: MarkerId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TickOutcome {
    pub(crate) player: PlayerState,
    pub(crate) moving: bool,
    /// `None` while a dialog is open.
    pub(crate) interaction: Option<InteractionReport>,
    pub(crate) prompt: Prompt,
    pub(crate) event: Option<SessionEvent>,
}

/// Player position plus the exploring/dialog state machine.
pub(crate) struct Session {
    layout: Arc<SceneLayout>,
    dialogs: Arc<DialogTable>,
    player: PlayerState,
    speed: u32,
    phase: SessionPhase,
    // Re-armed only once Activate is seen released, so a held key cannot
    // reopen a dialog right after it is dismissed.
    activation_armed: bool,
}

impl Session {
    pub(crate) fn new(layout: Arc<SceneLayout>, dialogs: Arc<DialogTable>) -> Self {
        let spawn = layout.spawn();
        Self {
            player: PlayerState::spawn(spawn),
            speed: spawn.speed,
            phase: SessionPhase::Exploring,
            activation_armed: true,
            layout,
            dialogs,
        }
    }

    pub(crate) fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub(crate) fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub(crate) fn is_dialog_open(&self) -> bool {
        matches!(self.phase, SessionPhase::DialogOpen { .. })
    }

    pub(crate) fn tick(&mut self, input: &InputState, dismiss_pressed: bool) -> TickOutcome {
        if !input.is_down(InputAction::Activate) {
            self.activation_armed = true;
        }

        match &self.phase {
            SessionPhase::Exploring => self.tick_exploring(input),
            SessionPhase::DialogOpen { marker_id } => {
                let prompt = Prompt::ActivateNear(marker_id.clone());
                let event = if dismiss_pressed {
                    // The key that dismisses may itself be Activate.
                    self.activation_armed = !input.is_down(InputAction::Activate);
                    self.dismiss()
                        .map(|marker_id| SessionEvent::DialogClosed { marker_id })
                } else {
                    None
                };
                TickOutcome {
                    player: self.player,
                    moving: false,
                    interaction: None,
                    prompt,
                    event,
                }
            }
        }
    }

    /// Closes the open dialog. Returns the closed marker id, or `None` when
    /// already exploring.
    pub(crate) fn dismiss(&mut self) -> Option<MarkerId> {
        match std::mem::replace(&mut self.phase, SessionPhase::Exploring) {
            SessionPhase::DialogOpen { marker_id } => {
                info!(marker_id = %marker_id, "dialog_closed");
                Some(marker_id)
            }
            SessionPhase::Exploring => None,
        }
    }

    fn tick_exploring(&mut self, input: &InputState) -> TickOutcome {
        let result = resolve_move(
            &self.player,
            input,
            &self.layout,
            self.speed,
            NEAR_MARGIN_PX,
        );
        self.player = result.player;

        let interaction = if result.accepted {
            result.interaction
        } else {
            detect(&self.player.rect(), self.layout.markers(), NEAR_MARGIN_PX)
        };

        let prompt = match &interaction.near_marker_id {
            Some(id) => Prompt::ActivateNear(id.clone()),
            None => Prompt::Idle,
        };

        let event = match &interaction.near_marker_id {
            Some(id) if self.activation_armed && input.is_down(InputAction::Activate) => {
                Some(self.open_dialog(id.clone()))
            }
            _ => None,
        };

        TickOutcome {
            player: self.player,
            moving: result.moving,
            interaction: Some(interaction),
            prompt,
            event,
        }
    }

    fn open_dialog(&mut self, marker_id: MarkerId) -> SessionEvent {
        let content = match self.dialogs.lookup(&marker_id) {
            Some(content) => content.clone(),
            None => {
                warn!(marker_id = %marker_id, "dialog_content_missing");
                DialogContent::default()
            }
        };
        info!(
            marker_id = %marker_id,
            x = self.player.x,
            y = self.player.y,
            "dialog_opened"
        );
        self.phase = SessionPhase::DialogOpen {
            marker_id: marker_id.clone(),
        };
        self.activation_armed = false;
        SessionEvent::DialogOpened { marker_id, content }
    }
}
