use crate::common::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Tolerance used for zero tests and point comparisons.
pub const EPS: f64 = 1e-8;

/// A position (or displacement) in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Angle of the vector from the origin, in radians (atan2).
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }

    pub fn is_zero(&self) -> bool {
        self.norm() < EPS
    }

    /// Per-axis sign, with zero mapped to zero.
    pub fn signum(&self) -> Point {
        fn sign(v: f64) -> f64 {
            if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Point::new(sign(self.x), sign(self.y))
    }

    /// Component-wise closeness, mirroring an absolute plus relative tolerance.
    pub fn approx_eq(&self, other: &Point) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= EPS + 1e-5 * b.abs();
        close(self.x, other.x) && close(self.y, other.y)
    }

    pub fn get(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            _ => self.y,
        }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Velocity vector. Assigning a velocity through [`Velocity::rescaled`]
/// keeps its direction and sets its magnitude to the agent's maximum speed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub Point);

impl Velocity {
    pub const ZERO: Velocity = Velocity(Point::ORIGIN);

    /// Direction of `direction` with magnitude `max_speed`. A zero direction stays zero.
    pub fn rescaled(direction: Point, max_speed: f64) -> Self {
        if direction.is_zero() {
            return Velocity(direction);
        }
        Velocity(direction * (max_speed / direction.norm()))
    }

    pub fn speed(&self) -> f64 {
        self.0.norm()
    }

    pub fn angle(&self) -> f64 {
        self.0.angle()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Non-negative extent in both dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> DomainResult<Self> {
        if !(width >= 0.0 && height >= 0.0) {
            return Err(DomainError::InvalidGeometry {
                reason: format!("Negative size specified: ({}, {})", width, height),
            });
        }
        Ok(Self { width, height })
    }

    pub fn as_point(&self) -> Point {
        Point::new(self.width, self.height)
    }

    pub fn get(&self, axis: usize) -> f64 {
        match axis {
            0 => self.width,
            _ => self.height,
        }
    }

    /// Uniformly sampled point in `[0, width) x [0, height)`.
    pub fn random_internal_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point::new(rng.gen::<f64>() * self.width, rng.gen::<f64>() * self.height)
    }
}
