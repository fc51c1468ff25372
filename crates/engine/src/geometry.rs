/// Axis-aligned rectangle in scene pixel coordinates. `x`/`y` is the top-left
/// corner; y grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn square(x: i32, y: i32, size: u32) -> Self {
        Self::new(x, y, size, size)
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Inclusive containment: `inner` may share edges with `self`.
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        inner.x as i64 >= self.x as i64
            && inner.y as i64 >= self.y as i64
            && inner.right() <= self.right()
            && inner.bottom() <= self.bottom()
    }

    /// Half-open point test, so adjacent rects never both claim a pixel.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.x as i64 && x < self.right() && y >= self.y as i64 && y < self.bottom()
    }
}

/// Separating-axis overlap with strict inequalities: rects that only touch
/// along an edge do not intersect.
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    !(a.right() <= b.x as i64
        || a.x as i64 >= b.right()
        || a.bottom() <= b.y as i64
        || a.y as i64 >= b.bottom())
}

/// `a` grown by `margin` on every side, tested inclusively against `b`.
/// Touching at the expanded boundary counts as near.
pub fn is_near(a: &Rect, b: &Rect, margin: u32) -> bool {
    let margin = margin as i64;
    a.right() + margin >= b.x as i64
        && a.x as i64 - margin <= b.right()
        && a.bottom() + margin >= b.y as i64
        && a.y as i64 - margin <= b.bottom()
}
