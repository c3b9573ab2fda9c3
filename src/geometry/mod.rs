//! Coordinate and bounding-box math for pointer-driven interactions.
//!
//! Nothing here touches a UI surface. Functions compute points and event
//! orderings; a [`PointerDispatcher`] supplied by the caller performs them.

mod pointer;

pub use pointer::{
    click_sequence, dispatch_all, drag_sequence, PointerAction, PointerDispatcher, PointerEvent,
};

use crate::util::{VisionError, VisionResult};

/// A point in surface coordinates (CSS pixels or image pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle. `x`/`y` may be negative for off-screen elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point `(x + width/2, y + height/2)` without integer truncation.
    pub fn center(&self) -> Point {
        Point {
            x: f64::from(self.x) + f64::from(self.width) / 2.0,
            y: f64::from(self.y) + f64::from(self.height) / 2.0,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Returns true when the two boxes share at least one pixel.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox {
            x,
            y,
            width: (right - i64::from(x)) as u32,
            height: (bottom - i64::from(y)) as u32,
        }
    }
}

/// Position of one box relative to another, from center-to-center deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativePosition {
    pub offset_x: f64,
    pub offset_y: f64,
    pub is_above: bool,
    pub is_below: bool,
    pub is_left: bool,
    pub is_right: bool,
}

/// Euclidean distance between two points.
pub fn distance(p1: Point, p2: Point) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

/// Returns true when `bbox` lies entirely within a viewport anchored at the origin.
///
/// Boxes touching the viewport edges exactly count as inside.
pub fn is_in_viewport(bbox: &BoundingBox, viewport_width: u32, viewport_height: u32) -> bool {
    bbox.x >= 0
        && bbox.y >= 0
        && bbox.right() <= i64::from(viewport_width)
        && bbox.bottom() <= i64::from(viewport_height)
}

/// Describes where `a` sits relative to `b`.
///
/// Offsets are `center(a) - center(b)`. A zero delta on an axis sets neither
/// flag on that axis.
pub fn relative_position(a: &BoundingBox, b: &BoundingBox) -> RelativePosition {
    let ca = a.center();
    let cb = b.center();
    let offset_x = ca.x - cb.x;
    let offset_y = ca.y - cb.y;
    RelativePosition {
        offset_x,
        offset_y,
        is_above: offset_y < 0.0,
        is_below: offset_y > 0.0,
        is_left: offset_x < 0.0,
        is_right: offset_x > 0.0,
    }
}

/// Linear path from `from` to `to` made of `steps` evenly spaced points.
///
/// The start point is excluded and the last point equals `to`, matching how a
/// pointer moves in `steps` increments after it is already at `from`.
pub fn interpolate_path(from: Point, to: Point, steps: usize) -> VisionResult<Vec<Point>> {
    if steps < 1 {
        return Err(VisionError::invalid_argument(
            "interpolate_path requires at least one step",
        ));
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let n = steps as f64;
    let mut path = Vec::with_capacity(steps);
    for i in 1..steps {
        let t = i as f64 / n;
        path.push(Point::new(from.x + dx * t, from.y + dy * t));
    }
    path.push(to);
    Ok(path)
}

/// Center of `bbox` shifted by `(dx, dy)`, for clicks away from the middle.
pub fn offset_point(bbox: &BoundingBox, dx: f64, dy: f64) -> Point {
    let c = bbox.center();
    Point::new(c.x + dx, c.y + dy)
}
