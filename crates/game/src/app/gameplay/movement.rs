use roam_engine::{intersects, Facing, InputAction, InputState, PlayerSpawn, Rect, SceneLayout};

use super::interaction::{detect, InteractionReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlayerState {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) size: u32,
    pub(crate) facing: Facing,
}

impl PlayerState {
    pub(crate) fn spawn(spawn: PlayerSpawn) -> Self {
        Self {
            x: spawn.x,
            y: spawn.y,
            size: spawn.size,
            facing: Facing::Right,
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        Rect::square(self.x, self.y, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoveResult {
    pub(crate) player: PlayerState,
    pub(crate) moving: bool,
    pub(crate) accepted: bool,
    /// Detection against the candidate rect, accepted or not.
    pub(crate) interaction: InteractionReport,
}

pub(crate) fn movement_delta(input: &InputState, speed: u32) -> (i32, i32) {
    let axis = |negative: InputAction, positive: InputAction| {
        i64::from(input.is_down(positive)) - i64::from(input.is_down(negative))
    };
    let speed = i64::from(speed);
    let dx = axis(InputAction::MoveLeft, InputAction::MoveRight) * speed;
    let dy = axis(InputAction::MoveUp, InputAction::MoveDown) * speed;
    (saturate_i32(dx), saturate_i32(dy))
}

pub(crate) fn next_facing(current: Facing, input: &InputState) -> Facing {
    let mut facing = current;
    if input.is_down(InputAction::MoveLeft) {
        facing = Facing::Left;
    }
    if input.is_down(InputAction::MoveRight) {
        facing = Facing::Right;
    }
    facing
}

/// Moves the player one tick. The whole step is rejected if the candidate
/// rect would touch the inside of an obstacle or marker, or leave the scene.
pub(crate) fn resolve_move(
    player: &PlayerState,
    input: &InputState,
    layout: &SceneLayout,
    speed: u32,
    near_margin: u32,
) -> MoveResult {
    let (dx, dy) = movement_delta(input, speed);
    let candidate = player.rect().translated(dx, dy);
    let interaction = detect(&candidate, layout.markers(), near_margin);

    let blocked_by_obstacle = layout
        .obstacles()
        .iter()
        .any(|obstacle| intersects(&candidate, obstacle));
    let accepted = !blocked_by_obstacle
        && !interaction.blocking_overlap
        && layout.bounds().contains_rect(&candidate);

    let mut next = *player;
    next.facing = next_facing(player.facing, input);
    if accepted {
        next.x = candidate.x;
        next.y = candidate.y;
    }

    MoveResult {
        player: next,
        moving: input.any_direction_down(),
        accepted,
        interaction,
    }
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
