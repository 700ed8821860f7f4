//! Geometry primitives shared by the mindmap crates.
//!
//! Everything here lives in world space (the coordinate space node positions
//! are computed in) unless a name says otherwise. The [`viewport`] module maps
//! between world space and the physical screen.

pub mod viewport;

use serde::{Deserialize, Serialize};

pub use viewport::{Viewbox, Viewport, ViewportEvent, MAX_SCALE, MIN_SCALE, SCALE_STEP};

/// A point in world or screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Right edge
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal center
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical center
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx(), self.cy())
    }

    /// Check if a point lies inside (edges inclusive)
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x2() && p.y >= self.y && p.y <= self.y2()
    }

    /// Check if two boxes share any interior area
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x < other.x2() && other.x < self.x2() && self.y < other.y2() && other.y < self.y2()
    }

    /// Same size, new origin
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BBox) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let x2 = self.x2().max(other.x2());
        let y2 = self.y2().max(other.y2());
        Self::new(x, y, x2 - x, y2 - y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_edges_and_center() {
        let b = BBox::new(10.0, 20.0, 40.0, 10.0);
        assert_eq!(b.x2(), 50.0);
        assert_eq!(b.y2(), 30.0);
        assert_eq!(b.center(), Point::new(30.0, 25.0));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(Point::new(10.0, 10.0)));
        assert!(!b.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&BBox::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn union_covers_both() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(-5.0, 20.0, 10.0, 10.0);
        assert_eq!(a.union(&b), BBox::new(-5.0, 0.0, 15.0, 30.0));
    }
}
