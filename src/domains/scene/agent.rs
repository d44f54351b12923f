use crate::domains::geometry::{LineSegment, Path, Point, Velocity};
use crate::domains::grid::CellCoord;

/// Authoritative per-agent state, stored as parallel arrays indexed by the
/// agent's stable index. Only the scene mutates it.
#[derive(Debug, Clone)]
pub struct AgentStore {
    positions: Vec<Point>,
    last_positions: Vec<Point>,
    velocities: Vec<Velocity>,
    max_speeds: Vec<f64>,
    alive: Vec<bool>,
}

impl AgentStore {
    pub fn new(positions: Vec<Point>, max_speeds: Vec<f64>) -> Self {
        debug_assert_eq!(positions.len(), max_speeds.len());
        let count = positions.len();
        Self {
            last_positions: positions.clone(),
            positions,
            velocities: vec![Velocity::ZERO; count],
            max_speeds,
            alive: vec![true; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Point {
        self.positions[index]
    }

    pub fn last_position(&self, index: usize) -> Point {
        self.last_positions[index]
    }

    pub fn velocity(&self, index: usize) -> Velocity {
        self.velocities[index]
    }

    pub fn max_speed(&self, index: usize) -> f64 {
        self.max_speeds[index]
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.alive[index]
    }

    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Velocity] {
        &self.velocities
    }

    pub fn alive(&self) -> &[bool] {
        &self.alive
    }

    pub(crate) fn set_position(&mut self, index: usize, position: Point) {
        self.positions[index] = position;
    }

    /// Points the agent along `direction` at its maximum speed.
    pub(crate) fn set_velocity(&mut self, index: usize, direction: Point) {
        self.velocities[index] = Velocity::rescaled(direction, self.max_speeds[index]);
    }

    /// Snapshots positions, then moves every agent by `velocity * dt`.
    pub(crate) fn advance(&mut self, dt: f64) {
        self.last_positions.copy_from_slice(&self.positions);
        for (position, velocity) in self.positions.iter_mut().zip(&self.velocities) {
            *position = *position + velocity.0 * dt;
        }
    }

    pub(crate) fn retire(&mut self, index: usize) {
        self.alive[index] = false;
        self.velocities[index] = Velocity::ZERO;
    }
}

/// A pedestrian still walking its route.
#[derive(Debug, Clone)]
pub struct Walker {
    index: usize,
    origin: Point,
    path: Path,
    line: LineSegment,
    cell: CellCoord,
}

impl Walker {
    pub(crate) fn new(index: usize, origin: Point, path: Path, line: LineSegment, cell: CellCoord) -> Self {
        Self {
            index,
            origin,
            path,
            line,
            cell,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Segments still to walk after the current one.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Segment currently being walked.
    pub fn line(&self) -> &LineSegment {
        &self.line
    }

    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    pub(crate) fn set_cell(&mut self, cell: CellCoord) {
        self.cell = cell;
    }

    /// Moves on to the next segment, or returns `None` when the route is done.
    pub(crate) fn next_line(&mut self) -> Option<LineSegment> {
        let next = self.path.pop_next_segment()?;
        self.line = next;
        Some(next)
    }
}

/// Slot in the scene's agent list. Exited pedestrians stay as inert
/// placeholders so that indices never shift.
#[derive(Debug, Clone)]
pub enum Pedestrian {
    Walking(Walker),
    Exited { index: usize, origin: Point },
}

impl Pedestrian {
    pub fn index(&self) -> usize {
        match self {
            Pedestrian::Walking(walker) => walker.index,
            Pedestrian::Exited { index, .. } => *index,
        }
    }

    pub fn origin(&self) -> Point {
        match self {
            Pedestrian::Walking(walker) => walker.origin,
            Pedestrian::Exited { origin, .. } => *origin,
        }
    }

    pub fn walker(&self) -> Option<&Walker> {
        match self {
            Pedestrian::Walking(walker) => Some(walker),
            Pedestrian::Exited { .. } => None,
        }
    }

    pub(crate) fn walker_mut(&mut self) -> Option<&mut Walker> {
        match self {
            Pedestrian::Walking(walker) => Some(walker),
            Pedestrian::Exited { .. } => None,
        }
    }

    pub(crate) fn placeholder(&self) -> Pedestrian {
        Pedestrian::Exited {
            index: self.index(),
            origin: self.origin(),
        }
    }
}

/// Read accessor for one agent: its slot plus the scene-owned state arrays.
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    store: &'a AgentStore,
    pedestrian: &'a Pedestrian,
}

impl<'a> AgentView<'a> {
    pub(crate) fn new(store: &'a AgentStore, pedestrian: &'a Pedestrian) -> Self {
        Self { store, pedestrian }
    }

    pub fn index(&self) -> usize {
        self.pedestrian.index()
    }

    pub fn origin(&self) -> Point {
        self.pedestrian.origin()
    }

    pub fn position(&self) -> Point {
        self.store.position(self.index())
    }

    pub fn last_position(&self) -> Point {
        self.store.last_position(self.index())
    }

    pub fn velocity(&self) -> Velocity {
        self.store.velocity(self.index())
    }

    pub fn max_speed(&self) -> f64 {
        self.store.max_speed(self.index())
    }

    pub fn is_alive(&self) -> bool {
        self.store.is_alive(self.index())
    }

    pub fn line(&self) -> Option<&'a LineSegment> {
        self.pedestrian.walker().map(Walker::line)
    }

    pub fn path(&self) -> Option<&'a Path> {
        self.pedestrian.walker().map(Walker::path)
    }

    pub fn cell(&self) -> Option<CellCoord> {
        self.pedestrian.walker().map(Walker::cell)
    }
}
