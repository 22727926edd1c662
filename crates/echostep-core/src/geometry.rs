use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world pixels. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open overlap test: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Penetration depth along x. Negative when the boxes are apart.
    pub fn overlap_x(&self, other: &Rect) -> f32 {
        self.right().min(other.right()) - self.x.max(other.x)
    }

    /// Penetration depth along y. Negative when the boxes are apart.
    pub fn overlap_y(&self, other: &Rect) -> f32 {
        self.bottom().min(other.bottom()) - self.y.max(other.y)
    }
}

/// Collision box descriptor relative to an entity's origin.
///
/// The offset may be negative; the box need not contain the origin.
/// Bounds are replaced wholesale, never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    width: f32,
    height: f32,
    offset_x: f32,
    offset_y: f32,
}

impl Bounds {
    /// Negative sizes are clamped to zero.
    pub fn new(width: f32, height: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            offset_x,
            offset_y,
        }
    }

    /// Bounds covering exactly `width` x `height` at the origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(width, height, 0.0, 0.0)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn offset_x(&self) -> f32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> f32 {
        self.offset_y
    }

    /// World-space box for an entity whose origin is at `(x, y)`.
    pub fn collision_box(&self, x: f32, y: f32) -> Rect {
        Rect {
            x: x + self.offset_x,
            y: y + self.offset_y,
            width: self.width,
            height: self.height,
        }
    }
}
