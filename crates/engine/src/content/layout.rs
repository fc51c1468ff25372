use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::geometry::{intersects, Rect};

pub const MAX_PLAYER_SPEED: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Obstacle,
    Marker,
}

/// One entry of the scene configuration, as supplied by a loader. Extents are
/// signed so malformed input can be reported instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRecord {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: RecordKind,
    pub id: Option<String>,
}

impl SceneRecord {
    pub fn obstacle(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind: RecordKind::Obstacle,
            id: None,
        }
    }

    pub fn marker(id: &str, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind: RecordKind::Marker,
            id: Some(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRecord {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub speed: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSpawn {
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub speed: u32,
}

impl PlayerSpawn {
    pub fn rect(&self) -> Rect {
        Rect::square(self.x, self.y, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneLayoutError {
    #[error("scene bounds must be positive, got {width}x{height}")]
    InvalidBounds { width: i32, height: i32 },
    #[error("record {index} has negative size {width}x{height}")]
    NegativeSize {
        index: usize,
        width: i32,
        height: i32,
    },
    #[error("record {index} is a marker without an id")]
    MissingMarkerId { index: usize },
    #[error("record {index} reuses marker id '{id}'")]
    DuplicateMarkerId { index: usize, id: String },
    #[error("record {index} lies outside the {width}x{height} scene")]
    OutOfBounds {
        index: usize,
        width: u32,
        height: u32,
    },
    #[error("player size must be positive, got {size}")]
    InvalidPlayerSize { size: i32 },
    #[error("player speed must be in 1..={max}, got {speed}")]
    InvalidPlayerSpeed { speed: i32, max: u32 },
    #[error("player spawn ({x}, {y}) does not fit inside the scene")]
    SpawnOutOfBounds { x: i32, y: i32 },
    #[error("player spawn overlaps record {index}")]
    SpawnBlocked { index: usize },
}

impl SceneLayoutError {
    /// Index of the offending record, when the error is about one.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            Self::NegativeSize { index, .. }
            | Self::MissingMarkerId { index }
            | Self::DuplicateMarkerId { index, .. }
            | Self::OutOfBounds { index, .. }
            | Self::SpawnBlocked { index } => Some(*index),
            _ => None,
        }
    }
}

/// Static scene geometry. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLayout {
    width: u32,
    height: u32,
    spawn: PlayerSpawn,
    obstacles: Vec<Rect>,
    markers: Vec<Marker>,
}

impl SceneLayout {
    pub fn from_records(
        width: i32,
        height: i32,
        player: PlayerRecord,
        records: &[SceneRecord],
    ) -> Result<Self, SceneLayoutError> {
        if width <= 0 || height <= 0 {
            return Err(SceneLayoutError::InvalidBounds { width, height });
        }
        let (width, height) = (width as u32, height as u32);
        let bounds = Rect::new(0, 0, width, height);

        let mut obstacles = Vec::new();
        let mut markers = Vec::<Marker>::new();
        let mut record_rects = Vec::with_capacity(records.len());
        let mut seen_ids = HashMap::<&str, usize>::new();

        for (index, record) in records.iter().enumerate() {
            if record.width < 0 || record.height < 0 {
                return Err(SceneLayoutError::NegativeSize {
                    index,
                    width: record.width,
                    height: record.height,
                });
            }
            let rect = Rect::new(
                record.x,
                record.y,
                record.width as u32,
                record.height as u32,
            );
            if !bounds.contains_rect(&rect) {
                return Err(SceneLayoutError::OutOfBounds {
                    index,
                    width,
                    height,
                });
            }
            record_rects.push(rect);

            match record.kind {
                RecordKind::Obstacle => obstacles.push(rect),
                RecordKind::Marker => {
                    let id = record
                        .id
                        .as_deref()
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .ok_or(SceneLayoutError::MissingMarkerId { index })?;
                    if seen_ids.insert(id, index).is_some() {
                        return Err(SceneLayoutError::DuplicateMarkerId {
                            index,
                            id: id.to_string(),
                        });
                    }
                    markers.push(Marker {
                        id: MarkerId::new(id),
                        rect,
                    });
                }
            }
        }

        let spawn = validate_player(player, &bounds, &record_rects)?;

        Ok(Self {
            width,
            height,
            spawn,
            obstacles,
            markers,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn spawn(&self) -> PlayerSpawn {
        self.spawn
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == *id)
    }
}

fn validate_player(
    player: PlayerRecord,
    bounds: &Rect,
    record_rects: &[Rect],
) -> Result<PlayerSpawn, SceneLayoutError> {
    if player.size <= 0 {
        return Err(SceneLayoutError::InvalidPlayerSize { size: player.size });
    }
    if player.speed <= 0 || player.speed as u32 > MAX_PLAYER_SPEED {
        return Err(SceneLayoutError::InvalidPlayerSpeed {
            speed: player.speed,
            max: MAX_PLAYER_SPEED,
        });
    }
    let spawn = PlayerSpawn {
        x: player.x,
        y: player.y,
        size: player.size as u32,
        speed: player.speed as u32,
    };
    let rect = spawn.rect();
    if !bounds.contains_rect(&rect) {
        return Err(SceneLayoutError::SpawnOutOfBounds {
            x: player.x,
            y: player.y,
        });
    }
    if let Some(index) = record_rects
        .iter()
        .position(|record| intersects(&rect, record))
    {
        return Err(SceneLayoutError::SpawnBlocked { index });
    }
    Ok(spawn)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: PlayerRecord = PlayerRecord {
        x: 60,
        y: 250,
        size: 32,
        speed: 2,
    };

    #[test]
    fn records_keep_their_order_per_kind() {
        let layout = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[
                SceneRecord::marker("b", 200, 10, 10, 10),
                SceneRecord::obstacle(0, 0, 400, 5),
                SceneRecord::marker("a", 200, 40, 10, 10),
                SceneRecord::obstacle(0, 295, 400, 5),
            ],
        )
        .expect("layout");

        let ids = layout
            .markers()
            .iter()
            .map(|marker| marker.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(layout.obstacles()[0], Rect::new(0, 0, 400, 5));
        assert_eq!(layout.obstacles()[1], Rect::new(0, 295, 400, 5));
        assert_eq!(layout.spawn().rect(), Rect::square(60, 250, 32));
    }

    #[test]
    fn negative_extent_is_rejected_with_index() {
        let err = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[
                SceneRecord::obstacle(0, 0, 10, 10),
                SceneRecord::obstacle(10, 10, -5, 10),
            ],
        )
        .expect_err("negative width");
        assert_eq!(
            err,
            SceneLayoutError::NegativeSize {
                index: 1,
                width: -5,
                height: 10
            }
        );
        assert_eq!(err.record_index(), Some(1));
    }

    #[test]
    fn marker_requires_non_blank_id() {
        let mut record = SceneRecord::marker("x", 10, 10, 5, 5);
        record.id = Some("   ".to_string());
        let err = SceneLayout::from_records(400, 300, PLAYER, &[record]).expect_err("blank id");
        assert_eq!(err, SceneLayoutError::MissingMarkerId { index: 0 });

        let mut record = SceneRecord::marker("x", 10, 10, 5, 5);
        record.id = None;
        let err = SceneLayout::from_records(400, 300, PLAYER, &[record]).expect_err("no id");
        assert_eq!(err, SceneLayoutError::MissingMarkerId { index: 0 });
    }

    #[test]
    fn duplicate_marker_id_is_rejected() {
        let err = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[
                SceneRecord::marker("dialog1", 10, 10, 5, 5),
                SceneRecord::marker("dialog1", 30, 10, 5, 5),
            ],
        )
        .expect_err("duplicate");
        assert_eq!(
            err,
            SceneLayoutError::DuplicateMarkerId {
                index: 1,
                id: "dialog1".to_string()
            }
        );
    }

    #[test]
    fn record_outside_bounds_is_rejected() {
        let err = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[SceneRecord::obstacle(390, 0, 20, 10)],
        )
        .expect_err("out of bounds");
        assert_eq!(err.record_index(), Some(0));
    }

    #[test]
    fn non_positive_bounds_are_rejected() {
        let err = SceneLayout::from_records(0, 300, PLAYER, &[]).expect_err("bounds");
        assert_eq!(
            err,
            SceneLayoutError::InvalidBounds {
                width: 0,
                height: 300
            }
        );
    }

    #[test]
    fn spawn_must_fit_and_be_clear() {
        let outside = PlayerRecord { x: 390, ..PLAYER };
        assert_eq!(
            SceneLayout::from_records(400, 300, outside, &[]).expect_err("outside"),
            SceneLayoutError::SpawnOutOfBounds { x: 390, y: 250 }
        );

        let blocked = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[
                SceneRecord::obstacle(0, 0, 10, 10),
                SceneRecord::marker("m", 70, 260, 5, 5),
            ],
        )
        .expect_err("blocked");
        assert_eq!(blocked, SceneLayoutError::SpawnBlocked { index: 1 });
    }

    #[test]
    fn spawn_touching_an_obstacle_is_allowed() {
        let layout = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[SceneRecord::obstacle(92, 200, 20, 100)],
        );
        assert!(layout.is_ok());
    }

    #[test]
    fn player_size_and_speed_are_validated() {
        let zero_size = PlayerRecord { size: 0, ..PLAYER };
        assert_eq!(
            SceneLayout::from_records(400, 300, zero_size, &[]).expect_err("size"),
            SceneLayoutError::InvalidPlayerSize { size: 0 }
        );
        let fast = PlayerRecord {
            speed: MAX_PLAYER_SPEED as i32 + 1,
            ..PLAYER
        };
        assert!(matches!(
            SceneLayout::from_records(400, 300, fast, &[]).expect_err("speed"),
            SceneLayoutError::InvalidPlayerSpeed { .. }
        ));
    }

    #[test]
    fn marker_lookup_by_id() {
        let layout = SceneLayout::from_records(
            400,
            300,
            PLAYER,
            &[SceneRecord::marker("dialog4", 375, 270, 10, 10)],
        )
        .expect("layout");
        let marker = layout.marker(&MarkerId::from("dialog4")).expect("marker");
        assert_eq!(marker.rect, Rect::new(375, 270, 10, 10));
        assert!(layout.marker(&MarkerId::from("nope")).is_none());
    }
}
