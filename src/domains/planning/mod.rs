pub mod graph;
pub mod local;

pub use graph::*;
pub use local::*;

use crate::common::DomainResult;
use crate::domains::geometry::{Path, Point};
use crate::domains::obstacles::Obstacle;
use serde::{Deserialize, Serialize};

/// Produces a complete, contiguous route from a start position to the exit.
pub trait RoutePlanner {
    fn plan(&self, agent: usize, start: Point) -> DomainResult<Path>;
}

/// Shortest-path search used on the visibility graph. Both return optimal routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningAlgorithm {
    #[default]
    AStar,
    Dijkstra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    /// Visibility graph built once per scene.
    #[default]
    Graph,
    /// Per-agent detour heuristic, no persistent graph.
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub kind: PlannerKind,
    pub algorithm: PlanningAlgorithm,
    /// Outward offset of obstacle corners used as graph nodes.
    pub corner_margin: f64,
    /// Distance a detour sub-goal is pushed away from the blocking corner.
    pub detour_margin: f64,
    pub max_detour_steps: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            kind: PlannerKind::Graph,
            algorithm: PlanningAlgorithm::AStar,
            corner_margin: 1.0,
            detour_margin: 3.0,
            max_detour_steps: 64,
        }
    }
}

/// Aim point on `target` for an agent at `position`: each coordinate is kept
/// when already inside the target's interval on that axis, otherwise clamped
/// to the nearer bound.
pub fn get_goal(position: &Point, target: &Obstacle) -> Point {
    target.goal_for(position)
}
