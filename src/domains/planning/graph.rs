use super::{get_goal, PlanningAlgorithm, RoutePlanner};
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{LineSegment, Path, Point};
use crate::domains::obstacles::ObstacleLayout;
use crate::domains::DomainLogger;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};

/// Node of the visibility graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphNode {
    /// The exit rectangle; edges to it end at the projected goal point.
    Exit,
    /// Obstacle corner pushed out by its margin.
    Corner(Point),
    /// Temporary node at an agent's position.
    Start(Point),
}

impl GraphNode {
    pub fn position(&self) -> Option<Point> {
        match self {
            GraphNode::Exit => None,
            GraphNode::Corner(p) | GraphNode::Start(p) => Some(*p),
        }
    }
}

/// Visibility graph over inflated obstacle corners plus the exit.
///
/// Two nodes are joined when the straight line between them passes through
/// no interior obstacle (touching a boundary is allowed). Edge weights are
/// Euclidean lengths.
#[derive(Debug, Clone)]
pub struct VisibilityGraph {
    graph: UnGraph<GraphNode, f64>,
    exit: NodeIndex,
}

impl VisibilityGraph {
    pub fn build(layout: &ObstacleLayout) -> Self {
        let mut graph = UnGraph::new_undirected();
        let exit = graph.add_node(GraphNode::Exit);
        for obstacle in layout.obstacles() {
            if !obstacle.is_interior() || obstacle.is_permeable() {
                continue;
            }
            for corner in obstacle.inflated_corners() {
                if layout.is_within_boundaries(&corner) {
                    graph.add_node(GraphNode::Corner(corner));
                }
            }
        }

        let mut visibility = Self { graph, exit };
        let corners: Vec<NodeIndex> = visibility.graph.node_indices().filter(|n| *n != exit).collect();
        for (i, &node) in corners.iter().enumerate() {
            visibility.connect_to_exit(node, layout);
            for &other in &corners[i + 1..] {
                visibility.connect_if_visible(node, other, layout);
            }
        }
        visibility
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn exit(&self) -> NodeIndex {
        self.exit
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph.node_indices().map(move |n| (n, &self.graph[n]))
    }

    pub fn are_connected(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    fn position(&self, node: NodeIndex) -> Option<Point> {
        self.graph[node].position()
    }

    fn connect_to_exit(&mut self, node: NodeIndex, layout: &ObstacleLayout) {
        let Some(from) = self.position(node) else { return };
        let line = LineSegment::new(from, get_goal(&from, layout.exit()));
        if layout.is_line_free(&line, true) {
            self.graph.add_edge(node, self.exit, line.length());
        }
    }

    fn connect_if_visible(&mut self, a: NodeIndex, b: NodeIndex, layout: &ObstacleLayout) {
        let (Some(from), Some(to)) = (self.position(a), self.position(b)) else {
            return;
        };
        let line = LineSegment::new(from, to);
        if layout.is_line_free(&line, true) {
            self.graph.add_edge(a, b, line.length());
        }
    }

    /// Copy of the graph with `start` inserted and connected by the same rule.
    pub fn with_start(&self, start: Point, layout: &ObstacleLayout) -> (Self, NodeIndex) {
        let mut extended = self.clone();
        let node = extended.graph.add_node(GraphNode::Start(start));
        extended.connect_to_exit(node, layout);
        let others: Vec<NodeIndex> = extended
            .graph
            .node_indices()
            .filter(|n| *n != node && *n != extended.exit)
            .collect();
        for other in others {
            extended.connect_if_visible(node, other, layout);
        }
        (extended, node)
    }

    /// Shortest node sequence from `start` to the exit, with its total cost.
    pub fn shortest_path(
        &self,
        start: NodeIndex,
        algorithm: PlanningAlgorithm,
        layout: &ObstacleLayout,
    ) -> Option<(f64, Vec<NodeIndex>)> {
        let exit = self.exit;
        let exit_rect = layout.exit();
        astar(
            &self.graph,
            start,
            |n| n == exit,
            |e| *e.weight(),
            |n| match (algorithm, self.graph[n].position()) {
                (PlanningAlgorithm::AStar, Some(p)) => p.distance_to(&get_goal(&p, exit_rect)),
                _ => 0.0,
            },
        )
    }
}

/// Routes every agent over a visibility graph built once per scene.
pub struct GraphPlanner<'a> {
    layout: &'a ObstacleLayout,
    graph: VisibilityGraph,
    algorithm: PlanningAlgorithm,
}

impl<'a> GraphPlanner<'a> {
    pub fn new(layout: &'a ObstacleLayout, algorithm: PlanningAlgorithm, logger: &dyn DomainLogger) -> Self {
        let graph = VisibilityGraph::build(layout);
        logger.info(&format!(
            "Built visibility graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        ));
        Self {
            layout,
            graph,
            algorithm,
        }
    }

    pub fn graph(&self) -> &VisibilityGraph {
        &self.graph
    }
}

impl RoutePlanner for GraphPlanner<'_> {
    fn plan(&self, agent: usize, start: Point) -> DomainResult<Path> {
        let (graph, start_node) = self.graph.with_start(start, self.layout);
        let (_, nodes) = graph
            .shortest_path(start_node, self.algorithm, self.layout)
            .ok_or(DomainError::NoRoute {
                agent,
                x: start.x,
                y: start.y,
            })?;

        let mut path = Path::new();
        let mut previous = start;
        // Skip the start node and the exit node; the final hop is re-targeted
        // at the nearest point of the exit rectangle.
        for &node in &nodes[1..nodes.len() - 1] {
            let point = graph.position(node).ok_or_else(|| DomainError::DisconnectedPath {
                reason: "exit node found inside a route".to_string(),
            })?;
            path.push(LineSegment::new(previous, point))?;
            previous = point;
        }
        path.push(LineSegment::new(previous, get_goal(&previous, self.layout.exit())))?;
        Ok(path)
    }
}
