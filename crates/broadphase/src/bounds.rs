//! Axis-aligned bounding boxes.

use glam::Vec2;

/// Axis-aligned bounding box described by its minimum and maximum corners.
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`. A zero-extent interval
/// on either axis is allowed. "North" is toward `-y` throughout the crate,
/// matching screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Create a box from its corner coordinates.
    #[inline]
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y, "inverted Aabb corners");
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Create a box from its corner points.
    #[inline]
    pub fn from_corners(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// Create a box centered on `center` with the given half extents.
    #[inline]
    pub fn from_center(center: Vec2, half_x: f32, half_y: f32) -> Self {
        let he = Vec2::new(half_x, half_y);
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Center point of the box.
    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Check whether two boxes overlap. Closed-interval semantics: boxes
    /// that merely touch on an edge or corner count as overlapping, which
    /// is what a broad-phase candidate test wants.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Split the box at its center into four quadrants, in fixed
    /// NW, NE, SW, SE order.
    #[inline]
    pub fn quadrants(&self) -> [Aabb; 4] {
        let c = self.center();
        [
            Self::new(self.min.x, self.min.y, c.x, c.y),
            Self::new(c.x, self.min.y, self.max.x, c.y),
            Self::new(self.min.x, c.y, c.x, self.max.y),
            Self::new(c.x, c.y, self.max.x, self.max.y),
        ]
    }

    /// Width of the box.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}
