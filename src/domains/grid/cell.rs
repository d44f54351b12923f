use crate::domains::geometry::{LineSegment, Point, Rect};
use crate::domains::obstacles::{is_clear_of, Obstacle, ObstacleLayout};
use crate::domains::DomainLogger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Grid coordinate of a cell: `(x index, y index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord(pub usize, pub usize);

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// One tile of the grid partition.
///
/// Geometry is fixed after construction. The obstacle cache is filled once;
/// agent membership changes every tick.
#[derive(Debug, Clone)]
pub struct Cell {
    coord: CellCoord,
    bounds: Rect,
    obstacle_names: BTreeSet<String>,
    obstacle_indices: Vec<usize>,
    agents: BTreeSet<usize>,
}

impl Cell {
    pub fn new(coord: CellCoord, bounds: Rect) -> Self {
        Self {
            coord,
            bounds,
            obstacle_names: BTreeSet::new(),
            obstacle_indices: Vec::new(),
            agents: BTreeSet::new(),
        }
    }

    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn obstacle_names(&self) -> &BTreeSet<String> {
        &self.obstacle_names
    }

    pub fn agents(&self) -> &BTreeSet<usize> {
        &self.agents
    }

    /// Edges of the cell as a closed loop.
    fn edges(&self) -> [LineSegment; 4] {
        let [a, b, c, d] = self.bounds.corners();
        // corners are (min,min), (min,max), (max,min), (max,max)
        [
            LineSegment::new(a, b),
            LineSegment::new(b, d),
            LineSegment::new(d, c),
            LineSegment::new(c, a),
        ]
    }

    fn is_relevant(&self, obstacle: &Obstacle) -> bool {
        if self.bounds.contains(&obstacle.center()) || obstacle.contains(&self.center()) {
            return true;
        }
        self.edges().iter().any(|edge| obstacle.is_crossed_by(edge, false))
    }

    /// Caches every obstacle that is contained in the cell, contains the cell,
    /// or is crossed by one of the cell's edges.
    pub fn obtain_relevant_obstacles(&mut self, obstacles: &[Obstacle]) {
        for (index, obstacle) in obstacles.iter().enumerate() {
            if self.is_relevant(obstacle) && self.obstacle_names.insert(obstacle.name().to_string()) {
                self.obstacle_indices.push(index);
            }
        }
    }

    /// Restores a persisted obstacle cache, resolving names against `layout`.
    /// Returns false when a name is unknown to the layout.
    pub(crate) fn restore_obstacles(&mut self, names: impl IntoIterator<Item = String>, layout: &ObstacleLayout) -> bool {
        for name in names {
            match layout.obstacles().iter().position(|o| o.name() == name) {
                Some(index) => {
                    if self.obstacle_names.insert(name) {
                        self.obstacle_indices.push(index);
                    }
                }
                None => return false,
            }
        }
        true
    }

    /// Cached obstacles, resolved against the layout they were computed from.
    pub fn obstacles<'a>(&'a self, layout: &'a ObstacleLayout) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.obstacle_indices.iter().map(move |&i| &layout.obstacles()[i])
    }

    pub fn add_agent(&mut self, index: usize) {
        assert!(
            self.agents.insert(index),
            "agent {} is already registered in cell {}",
            index,
            self.coord
        );
    }

    pub fn remove_agent(&mut self, index: usize) {
        assert!(
            self.agents.remove(&index),
            "agent {} is not registered in cell {}",
            index,
            self.coord
        );
    }

    /// Open-set membership: points on the cell boundary are outside.
    pub fn strictly_contains(&self, point: &Point) -> bool {
        self.bounds.begin.x < point.x
            && point.x < self.bounds.end.x
            && self.bounds.begin.y < point.y
            && point.y < self.bounds.end.y
    }

    /// Accessibility using only the cell's cached obstacles.
    /// Points outside the (open) cell are reported inaccessible.
    pub fn is_accessible(&self, point: &Point, at_start: bool, layout: &ObstacleLayout, logger: &dyn DomainLogger) -> bool {
        if !self.strictly_contains(point) {
            logger.warn(&format!("Accessibility of {} requested outside of cell {}", point, self.coord));
            return false;
        }
        is_clear_of(self.obstacles(layout), point, at_start)
    }
}
