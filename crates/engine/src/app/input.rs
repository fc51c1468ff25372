#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Activate,
}

const ACTION_COUNT: usize = 5;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Activate,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Activate => 4,
        }
    }

    pub const fn is_direction(self) -> bool {
        !matches!(self, InputAction::Activate)
    }

    /// Maps a logical key name (`"w"`, `"ArrowUp"`, `"F"`, ...) to an action,
    /// ignoring case.
    pub fn from_key_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let matches_any = |candidates: &[&str]| {
            candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name))
        };
        if matches_any(&["w", "arrowup", "up"]) {
            Some(InputAction::MoveUp)
        } else if matches_any(&["s", "arrowdown", "down"]) {
            Some(InputAction::MoveDown)
        } else if matches_any(&["a", "arrowleft", "left"]) {
            Some(InputAction::MoveLeft)
        } else if matches_any(&["d", "arrowright", "right"]) {
            Some(InputAction::MoveRight)
        } else if matches_any(&["f"]) {
            Some(InputAction::Activate)
        } else {
            None
        }
    }
}

/// Pressed/released flag per action. Writes are last-write-wins and a flag
/// only clears on an explicit release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    down: [bool; ACTION_COUNT],
}

impl InputState {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn any_direction_down(&self) -> bool {
        InputAction::ALL
            .iter()
            .any(|action| action.is_direction() && self.is_down(*action))
    }

    pub fn with(mut self, action: InputAction, is_down: bool) -> Self {
        self.set(action, is_down);
        self
    }
}
