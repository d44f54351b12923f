use crate::domains::geometry::{LineSegment, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Generic,
    Exit,
    Entrance,
}

/// Kind-specific behaviour, looked up per [`ObstacleKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindTraits {
    /// Agents may walk through the rectangle.
    pub permeable: bool,
    /// Participates in collision and visibility checks.
    pub interior: bool,
    /// Corners are pushed outward by the configured margin when used as graph nodes.
    pub margined: bool,
}

const KIND_TRAITS: [KindTraits; 3] = [
    // Generic
    KindTraits { permeable: false, interior: true, margined: true },
    // Exit
    KindTraits { permeable: true, interior: false, margined: false },
    // Entrance
    KindTraits { permeable: false, interior: true, margined: true },
];

impl ObstacleKind {
    pub fn traits(self) -> &'static KindTraits {
        &KIND_TRAITS[self as usize]
    }
}

/// Outward diagonal direction for each corner, in [`Rect::corners`] order.
const MARGIN_DIRECTIONS: [Point; 4] = [
    Point { x: -1.0, y: -1.0 },
    Point { x: -1.0, y: 1.0 },
    Point { x: 1.0, y: -1.0 },
    Point { x: 1.0, y: 1.0 },
];

/// Axis-aligned rectangular obstacle. The name is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    name: String,
    kind: ObstacleKind,
    bounds: Rect,
    corners: [Point; 4],
    margins: [Point; 4],
    spawn_rate: f64,
}

impl Obstacle {
    pub fn new(name: impl Into<String>, kind: ObstacleKind, begin: Point, size: Size, corner_margin: f64) -> Self {
        let bounds = Rect::new(begin, size);
        let margin = if kind.traits().margined { corner_margin } else { 0.0 };
        Self {
            name: name.into(),
            kind,
            bounds,
            corners: bounds.corners(),
            margins: MARGIN_DIRECTIONS.map(|direction| direction * margin),
            spawn_rate: 0.0,
        }
    }

    pub fn with_spawn_rate(mut self, spawn_rate: f64) -> Self {
        self.spawn_rate = spawn_rate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObstacleKind {
        self.kind
    }

    pub fn is_permeable(&self) -> bool {
        self.kind.traits().permeable
    }

    pub fn is_interior(&self) -> bool {
        self.kind.traits().interior
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn begin(&self) -> Point {
        self.bounds.begin
    }

    pub fn end(&self) -> Point {
        self.bounds.end
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    pub fn margins(&self) -> &[Point; 4] {
        &self.margins
    }

    pub fn spawn_rate(&self) -> f64 {
        self.spawn_rate
    }

    /// Corners pushed outward by their margin offsets.
    pub fn inflated_corners(&self) -> impl Iterator<Item = Point> + '_ {
        self.corners.iter().zip(self.margins.iter()).map(|(c, m)| *c + *m)
    }

    /// Inclusive-boundary membership.
    pub fn contains(&self, point: &Point) -> bool {
        self.bounds.contains(point)
    }

    /// Crossing test for a segment against this rectangle.
    /// `strict` allows touching the boundary.
    pub fn is_crossed_by(&self, segment: &LineSegment, strict: bool) -> bool {
        segment.crosses(&self.bounds, strict)
    }

    /// Nearest point on or inside the rectangle to `position`.
    pub fn goal_for(&self, position: &Point) -> Point {
        self.bounds.project(position)
    }
}

impl fmt::Display for Obstacle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {}. Bottom left: {}, Top right: {}",
            self.kind,
            self.name,
            self.begin(),
            self.end()
        )
    }
}
