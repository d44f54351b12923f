use super::coordinate::{Point, Size};
use crate::common::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Closed interval `[begin, end]` with `begin <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    begin: f64,
    end: f64,
}

impl Interval {
    pub fn new(begin: f64, end: f64) -> DomainResult<Self> {
        if !(begin <= end) {
            return Err(DomainError::InvalidGeometry {
                reason: format!("Interval start {} larger than interval end {}", begin, end),
            });
        }
        Ok(Self { begin, end })
    }

    pub fn begin(&self) -> f64 {
        self.begin
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.begin
    }

    pub fn contains(&self, value: f64) -> bool {
        self.begin <= value && value <= self.end
    }

    /// Nearest value inside the interval.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.contains(value) {
            value
        } else if value < self.begin {
            self.begin
        } else {
            self.end
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.begin + rng.gen::<f64>() * self.length()
    }
}

/// Axis-aligned rectangle spanned by `begin` (lower-left) and `end` (upper-right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub begin: Point,
    pub end: Point,
}

impl Rect {
    pub fn new(begin: Point, size: Size) -> Self {
        Self {
            begin,
            end: begin + size.as_point(),
        }
    }

    /// Bounding box of two arbitrary points.
    pub fn spanning(a: Point, b: Point) -> Self {
        Self {
            begin: Point::new(a.x.min(b.x), a.y.min(b.y)),
            end: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn size(&self) -> Point {
        self.end - self.begin
    }

    pub fn center(&self) -> Point {
        self.begin + self.size() * 0.5
    }

    pub fn interval(&self, axis: usize) -> Interval {
        Interval {
            begin: self.begin.get(axis),
            end: self.end.get(axis),
        }
    }

    /// Closed-set membership: the boundary counts as inside.
    pub fn contains(&self, point: &Point) -> bool {
        (0..2).all(|axis| self.interval(axis).contains(point.get(axis)))
    }

    /// Corners in the order (min,min), (min,max), (max,min), (max,max).
    pub fn corners(&self) -> [Point; 4] {
        [
            self.begin,
            Point::new(self.begin.x, self.end.y),
            Point::new(self.end.x, self.begin.y),
            self.end,
        ]
    }

    /// Overlap test. With `open_sets` the rectangles must share interior,
    /// otherwise touching boundaries already count.
    pub fn intersects(&self, other: &Rect, open_sets: bool) -> bool {
        (0..2).all(|axis| {
            let (a0, a1) = (self.begin.get(axis), self.end.get(axis));
            let (b0, b1) = (other.begin.get(axis), other.end.get(axis));
            if open_sets {
                a0 < b1 && b0 < a1
            } else {
                a0 <= b1 && b0 <= a1
            }
        })
    }

    /// Closest point on or inside the rectangle to `position`, clamped per axis.
    pub fn project(&self, position: &Point) -> Point {
        Point::new(
            self.interval(0).clamp(position.x),
            self.interval(1).clamp(position.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_interval_is_rejected() {
        assert!(Interval::new(2.0, 1.0).is_err());
        assert!(Interval::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn open_overlap_excludes_touching() {
        let a = Rect::spanning(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = Rect::spanning(Point::new(1.0, 0.0), Point::new(2.0, 1.0));
        assert!(a.intersects(&b, false));
        assert!(!a.intersects(&b, true));
    }
}
