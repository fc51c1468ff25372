use std::time::Duration;

use crate::geometry::Rect;

use super::input::{InputAction, InputState};

const BUTTON_SIZE_PX: u32 = 36;
const BUTTON_GAP_PX: u32 = 4;
const PAD_MARGIN_PX: u32 = 16;
const FALLBACK_REPEAT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualButton {
    pub action: InputAction,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeldButton {
    action: InputAction,
    until_repeat: Duration,
}

/// On-screen direction/activate buttons. A held button re-asserts its action
/// on a fixed interval until it is released or cancelled.
#[derive(Debug, Clone)]
pub struct VirtualPad {
    buttons: Vec<VirtualButton>,
    repeat_interval: Duration,
    held: Option<HeldButton>,
}

impl VirtualPad {
    pub fn new(scene_width: u32, scene_height: u32, repeat_interval: Duration) -> Self {
        let step = (BUTTON_SIZE_PX + BUTTON_GAP_PX) as i32;
        let cluster = BUTTON_SIZE_PX * 3 + BUTTON_GAP_PX * 2;
        let left = PAD_MARGIN_PX as i32;
        let top = scene_height.saturating_sub(PAD_MARGIN_PX + cluster) as i32;
        let button = |col: i32, row: i32, action| VirtualButton {
            action,
            rect: Rect::square(left + col * step, top + row * step, BUTTON_SIZE_PX),
        };
        let activate_left = scene_width.saturating_sub(PAD_MARGIN_PX + BUTTON_SIZE_PX) as i32;

        Self {
            buttons: vec![
                button(1, 0, InputAction::MoveUp),
                button(0, 1, InputAction::MoveLeft),
                button(2, 1, InputAction::MoveRight),
                button(1, 2, InputAction::MoveDown),
                VirtualButton {
                    action: InputAction::Activate,
                    rect: Rect::square(activate_left, top + 2 * step, BUTTON_SIZE_PX),
                },
            ],
            repeat_interval: if repeat_interval.is_zero() {
                FALLBACK_REPEAT_INTERVAL
            } else {
                repeat_interval
            },
            held: None,
        }
    }

    pub fn buttons(&self) -> &[VirtualButton] {
        &self.buttons
    }

    pub fn held_action(&self) -> Option<InputAction> {
        self.held.map(|held| held.action)
    }

    pub fn hit_test(&self, x: i32, y: i32) -> Option<InputAction> {
        self.buttons
            .iter()
            .find(|button| button.rect.contains_point(x, y))
            .map(|button| button.action)
    }

    /// Presses whichever button is under the pointer. Returns false when the
    /// pointer missed every button.
    pub fn press_at(&mut self, x: i32, y: i32, input: &mut InputState) -> bool {
        match self.hit_test(x, y) {
            Some(action) => {
                self.press(action, input);
                true
            }
            None => false,
        }
    }

    pub fn press(&mut self, action: InputAction, input: &mut InputState) {
        self.release(input);
        input.set(action, true);
        self.held = Some(HeldButton {
            action,
            until_repeat: self.repeat_interval,
        });
    }

    /// Stops the repeat timer and releases the held action. Safe to call
    /// when nothing is held.
    pub fn release(&mut self, input: &mut InputState) -> Option<InputAction> {
        let held = self.held.take()?;
        input.set(held.action, false);
        Some(held.action)
    }

    /// Advances the repeat timer; returns how many repeats fired.
    pub fn advance(&mut self, frame_dt: Duration, input: &mut InputState) -> u32 {
        let Some(held) = self.held.as_mut() else {
            return 0;
        };
        let mut remaining = frame_dt;
        let mut repeats = 0u32;
        while remaining >= held.until_repeat {
            remaining -= held.until_repeat;
            held.until_repeat = self.repeat_interval;
            repeats = repeats.saturating_add(1);
        }
        held.until_repeat -= remaining;
        if repeats > 0 {
            input.set(held.action, true);
        }
        repeats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> VirtualPad {
        VirtualPad::new(1045, 580, Duration::from_millis(100))
    }

    fn center_of(pad: &VirtualPad, action: InputAction) -> (i32, i32) {
        let rect = pad
            .buttons()
            .iter()
            .find(|button| button.action == action)
            .expect("button")
            .rect;
        (
            rect.x + rect.width as i32 / 2,
            rect.y + rect.height as i32 / 2,
        )
    }

    #[test]
    fn buttons_fit_inside_the_scene_without_overlap() {
        let pad = pad();
        let bounds = Rect::new(0, 0, 1045, 580);
        for (index, button) in pad.buttons().iter().enumerate() {
            assert!(bounds.contains_rect(&button.rect));
            for other in &pad.buttons()[index + 1..] {
                assert!(!crate::geometry::intersects(&button.rect, &other.rect));
            }
        }
        assert_eq!(pad.buttons().len(), InputAction::ALL.len());
    }

    #[test]
    fn press_at_asserts_the_button_action() {
        let mut pad = pad();
        let mut input = InputState::default();
        let (x, y) = center_of(&pad, InputAction::MoveRight);

        assert!(pad.press_at(x, y, &mut input));
        assert!(input.is_down(InputAction::MoveRight));
        assert_eq!(pad.held_action(), Some(InputAction::MoveRight));
    }

    #[test]
    fn press_outside_buttons_is_ignored() {
        let mut pad = pad();
        let mut input = InputState::default();
        assert!(!pad.press_at(500, 100, &mut input));
        assert_eq!(input, InputState::default());
        assert_eq!(pad.held_action(), None);
    }

    #[test]
    fn held_button_reasserts_after_external_release() {
        let mut pad = pad();
        let mut input = InputState::default();
        pad.press(InputAction::MoveLeft, &mut input);

        input.set(InputAction::MoveLeft, false);
        assert_eq!(pad.advance(Duration::from_millis(60), &mut input), 0);
        assert!(!input.is_down(InputAction::MoveLeft));

        assert_eq!(pad.advance(Duration::from_millis(40), &mut input), 1);
        assert!(input.is_down(InputAction::MoveLeft));
    }

    #[test]
    fn long_frame_fires_multiple_repeats() {
        let mut pad = pad();
        let mut input = InputState::default();
        pad.press(InputAction::MoveUp, &mut input);
        assert_eq!(pad.advance(Duration::from_millis(250), &mut input), 2);
        assert_eq!(pad.advance(Duration::from_millis(50), &mut input), 1);
    }

    #[test]
    fn release_stops_the_timer_and_clears_the_action() {
        let mut pad = pad();
        let mut input = InputState::default();
        pad.press(InputAction::Activate, &mut input);

        assert_eq!(pad.release(&mut input), Some(InputAction::Activate));
        assert!(!input.is_down(InputAction::Activate));
        assert_eq!(pad.advance(Duration::from_secs(5), &mut input), 0);
        assert!(!input.is_down(InputAction::Activate));
        assert_eq!(pad.release(&mut input), None);
    }

    #[test]
    fn pressing_another_button_releases_the_first() {
        let mut pad = pad();
        let mut input = InputState::default();
        pad.press(InputAction::MoveUp, &mut input);
        pad.press(InputAction::MoveDown, &mut input);

        assert!(!input.is_down(InputAction::MoveUp));
        assert!(input.is_down(InputAction::MoveDown));
        assert_eq!(pad.held_action(), Some(InputAction::MoveDown));
    }

    #[test]
    fn zero_repeat_interval_falls_back() {
        let mut pad = VirtualPad::new(200, 200, Duration::ZERO);
        let mut input = InputState::default();
        pad.press(InputAction::MoveUp, &mut input);
        assert_eq!(pad.advance(FALLBACK_REPEAT_INTERVAL, &mut input), 1);
    }
}
