use super::coordinate::Point;
use super::interval::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight segment between two points. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    begin: Point,
    end: Point,
}

impl LineSegment {
    pub fn new(begin: Point, end: Point) -> Self {
        Self { begin, end }
    }

    pub fn begin(&self) -> Point {
        self.begin
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.begin.distance_to(&self.end)
    }

    /// Point at parameter `t`, where 0 is `begin` and 1 is `end`.
    pub fn point_at(&self, t: f64) -> Point {
        self.begin + (self.end - self.begin) * t
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::spanning(self.begin, self.end)
    }

    /// Signed side of `point` relative to the infinite line through the segment.
    fn side_of(&self, point: &Point) -> f64 {
        let d = self.end - self.begin;
        d.y * (point.x - self.begin.x) - d.x * (point.y - self.begin.y)
    }

    /// Whether the segment passes through `rect`.
    ///
    /// Broad phase: the segment's bounding box must overlap the rectangle
    /// (`strict` ignores boundary-only contact). Narrow phase: if all four
    /// corners lie strictly on one side of the segment's line the rectangle is
    /// not crossed, otherwise the line separates it and it is.
    pub fn crosses(&self, rect: &Rect, strict: bool) -> bool {
        if !self.bounding_box().intersects(rect, strict) {
            return false;
        }
        let sign_sum: i32 = rect
            .corners()
            .iter()
            .map(|corner| {
                let side = self.side_of(corner);
                if side > 0.0 {
                    1
                } else if side < 0.0 {
                    -1
                } else {
                    0
                }
            })
            .sum();
        sign_sum.abs() != 4
    }
}

impl fmt::Display for LineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineSegment from {} to {}", self.begin, self.end)
    }
}
