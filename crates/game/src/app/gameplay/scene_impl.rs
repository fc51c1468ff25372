use std::time::Duration;

use roam_engine::{
    CancelToken, DialogView, InputSnapshot, PlayerView, Scene, SceneCommand, SceneContent,
    SceneWorld, TextReveal,
};
use tracing::info;

use super::session::{Session, SessionEvent, TickOutcome};

pub(crate) struct ExplorationScene {
    content: SceneContent,
    reveal_delay: Duration,
    session: Session,
    reveal: Option<ActiveReveal>,
}

struct ActiveReveal {
    text: TextReveal,
    cancel: CancelToken,
}

impl ExplorationScene {
    pub(crate) fn new(content: SceneContent, reveal_delay: Duration) -> Self {
        let session = Session::new(content.layout.clone(), content.dialogs.clone());
        Self {
            content,
            reveal_delay,
            session,
            reveal: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    fn cancel_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel.cancel();
        }
    }

    fn apply_event(&mut self, event: SessionEvent, world: &mut SceneWorld) -> SceneCommand {
        match event {
            SessionEvent::DialogOpened { content, .. } => {
                self.cancel_reveal();
                let cancel = CancelToken::new();
                self.reveal = Some(ActiveReveal {
                    text: TextReveal::new(&content.body, self.reveal_delay, cancel.clone()),
                    cancel,
                });
                world.open_dialog(DialogView {
                    title: content.title,
                    body: String::new(),
                    image_ref: content.image_ref,
                });
                SceneCommand::ReleaseHeldButtons
            }
            SessionEvent::DialogClosed { .. } => {
                self.cancel_reveal();
                world.close_dialog();
                SceneCommand::None
            }
        }
    }

    fn publish(&mut self, outcome: &TickOutcome, frame_dt: Duration, world: &mut SceneWorld) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.text.advance(frame_dt);
            if let Some(dialog) = world.dialog_mut() {
                if dialog.body.len() != reveal.text.revealed().len() {
                    dialog.body = reveal.text.revealed().to_string();
                }
            }
        }

        world.set_player(PlayerView {
            rect: outcome.player.rect(),
            facing: outcome.player.facing,
            moving: outcome.moving,
        });
        match &outcome.interaction {
            Some(report) => world.set_marker_highlights(&report.highlights),
            None => world.set_marker_highlights(&[]),
        }
        world.set_prompt(outcome.prompt.to_string());
    }
}

impl Scene for ExplorationScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.cancel_reveal();
        world.close_dialog();
        self.session = Session::new(
            self.content.layout.clone(),
            self.content.dialogs.clone(),
        );

        let layout = self.session.layout();
        world.set_layout(
            layout.width(),
            layout.height(),
            layout.obstacles().to_vec(),
            layout
                .markers()
                .iter()
                .map(|marker| (marker.id.clone(), marker.rect)),
        );
        let outcome = self.session.tick(&Default::default(), false);
        self.publish(&outcome, Duration::ZERO, world);
        info!(
            x = outcome.player.x,
            y = outcome.player.y,
            prompt = %outcome.prompt,
            "exploration_started"
        );
    }

    fn update(&mut self, input: &InputSnapshot, world: &mut SceneWorld) -> SceneCommand {
        let mut outcome = self.session.tick(input.actions(), input.dismiss_pressed());
        let command = match outcome.event.take() {
            Some(event) => self.apply_event(event, world),
            None => SceneCommand::None,
        };
        self.publish(&outcome, input.frame_dt(), world);
        command
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        self.cancel_reveal();
        world.close_dialog();
        info!(dialog_open = self.session.is_dialog_open(), "exploration_unloaded");
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        Some(world.prompt().to_string())
    }
}
