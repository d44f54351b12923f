use super::agent::{AgentStore, AgentView, Pedestrian, Walker};
use super::settings::SceneSettings;
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{Path, Point, Velocity};
use crate::domains::grid::{CellCoord, GridCacheStore, GridIndex};
use crate::domains::obstacles::ObstacleLayout;
use crate::domains::planning::{GraphPlanner, LocalDetourPlanner, PlannerKind, RoutePlanner};
use crate::domains::{DomainLogger, DynLogger};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offset added to pair distances in the minimum-distance correction.
const SEPARATION_EPS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Running,
    Done,
}

/// Snapshot of the agent arrays after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub time: f64,
    pub positions: Vec<Point>,
    pub velocities: Vec<Velocity>,
    pub alive: Vec<bool>,
}

type StepCallback = Box<dyn FnMut()>;
type ExitCallback = Box<dyn FnMut(AgentView<'_>)>;

/// The simulated world: obstacles, grid index and agents.
///
/// Agents are identified by a stable index into the state arrays. An agent
/// that reaches the exit keeps its slot as an inert placeholder.
pub struct Scene {
    id: Uuid,
    settings: SceneSettings,
    layout: ObstacleLayout,
    grid: GridIndex,
    store: AgentStore,
    pedestrians: Vec<Pedestrian>,
    floor_coords: Vec<(i64, i64)>,
    time: f64,
    ticks: u64,
    status: SceneStatus,
    finished: bool,
    on_step: Vec<StepCallback>,
    on_exit: Vec<ExitCallback>,
    on_finish: Vec<StepCallback>,
    logger: DynLogger,
}

/// Accessibility with the grid as broad phase. Points on a cell boundary
/// fall back to the full obstacle list.
fn accessible(layout: &ObstacleLayout, grid: &GridIndex, point: &Point, at_start: bool, logger: &dyn DomainLogger) -> bool {
    if !layout.is_within_boundaries(point) {
        return false;
    }
    match grid.cell_at(point) {
        Some(cell) if cell.strictly_contains(point) => cell.is_accessible(point, at_start, layout, logger),
        _ => layout.is_accessible(point, at_start),
    }
}

impl Scene {
    /// Builds the grid index through `cache`, then spawns and routes agents.
    pub fn new<R: Rng + ?Sized>(
        settings: SceneSettings,
        layout: ObstacleLayout,
        cache: &dyn GridCacheStore,
        rng: &mut R,
        logger: DynLogger,
    ) -> DomainResult<Self> {
        let grid = GridIndex::load_or_build(
            &layout,
            settings.cells_x,
            settings.cells_y,
            settings.cache_mode,
            cache,
            &settings.cache_name,
            logger.as_ref(),
        )?;
        Self::from_grid(settings, layout, grid, rng, logger)
    }

    /// Spawns `settings.pedestrians` agents at uniformly random accessible
    /// points of an already built grid.
    pub fn from_grid<R: Rng + ?Sized>(
        settings: SceneSettings,
        layout: ObstacleLayout,
        grid: GridIndex,
        rng: &mut R,
        logger: DynLogger,
    ) -> DomainResult<Self> {
        let domain = layout.domain();
        let mut positions = Vec::with_capacity(settings.pedestrians);
        let mut max_speeds = Vec::with_capacity(settings.pedestrians);
        for agent in 0..settings.pedestrians {
            let mut attempts = 0;
            let position = loop {
                if attempts == settings.spawn_attempts {
                    return Err(DomainError::SpawnFailed { agent, attempts });
                }
                attempts += 1;
                let candidate = domain.random_internal_point(rng);
                if accessible(&layout, &grid, &candidate, true, logger.as_ref()) {
                    break candidate;
                }
            };
            positions.push(position);
            max_speeds.push(if settings.max_speed_spread > 0.0 {
                rng.gen_range(settings.max_speed - settings.max_speed_spread..=settings.max_speed + settings.max_speed_spread)
            } else {
                settings.max_speed
            });
        }
        Self::populate(settings, layout, grid, positions, max_speeds, logger)
    }

    /// Places one agent at each of `positions`, all walking at `settings.max_speed`.
    pub fn with_positions(
        settings: SceneSettings,
        layout: ObstacleLayout,
        grid: GridIndex,
        positions: Vec<Point>,
        logger: DynLogger,
    ) -> DomainResult<Self> {
        for (agent, position) in positions.iter().enumerate() {
            if !accessible(&layout, &grid, position, true, logger.as_ref()) {
                return Err(DomainError::InvalidGeometry {
                    reason: format!("Agent {} placed at inaccessible point {}", agent, position),
                });
            }
        }
        let max_speeds = vec![settings.max_speed; positions.len()];
        Self::populate(settings, layout, grid, positions, max_speeds, logger)
    }

    fn populate(
        settings: SceneSettings,
        layout: ObstacleLayout,
        mut grid: GridIndex,
        positions: Vec<Point>,
        max_speeds: Vec<f64>,
        logger: DynLogger,
    ) -> DomainResult<Self> {
        logger.info("Started preprocessing global paths");
        let paths = match settings.planner.kind {
            PlannerKind::Graph => {
                let planner = GraphPlanner::new(&layout, settings.planner.algorithm, logger.as_ref());
                plan_all(&planner, &positions)?
            }
            PlannerKind::Local => {
                let planner = LocalDetourPlanner::new(&layout, settings.planner.detour_margin, settings.planner.max_detour_steps);
                plan_all(&planner, &positions)?
            }
        };
        logger.info("Finished preprocessing global paths");

        let mut store = AgentStore::new(positions, max_speeds);
        let mut pedestrians = Vec::with_capacity(store.len());
        let mut floor_coords = Vec::with_capacity(store.len());
        for (index, mut path) in paths.into_iter().enumerate() {
            let origin = store.position(index);
            let line = path.pop_next_segment().ok_or_else(|| DomainError::DisconnectedPath {
                reason: format!("Planner returned an empty route for agent {}", index),
            })?;
            store.set_velocity(index, line.end() - origin);

            let coord = grid.clamped_coord_of(&origin);
            if let Some(cell) = grid.cell_mut(coord) {
                cell.add_agent(index);
            }
            floor_coords.push(grid.floor_coord(&origin));
            pedestrians.push(Pedestrian::Walking(Walker::new(index, origin, path, line, coord)));
        }

        let id = Uuid::new_v4();
        logger.info(&format!("Scene {} created with {} agents", id, pedestrians.len()));
        Ok(Self {
            id,
            settings,
            layout,
            grid,
            store,
            pedestrians,
            floor_coords,
            time: 0.0,
            ticks: 0,
            status: SceneStatus::Running,
            finished: false,
            on_step: Vec::new(),
            on_exit: Vec::new(),
            on_finish: Vec::new(),
            logger,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn layout(&self) -> &ObstacleLayout {
        &self.layout
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn status(&self) -> SceneStatus {
        self.status
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn agent_count(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn alive_count(&self) -> usize {
        self.store.alive_count()
    }

    pub fn pedestrian(&self, index: usize) -> Option<&Pedestrian> {
        self.pedestrians.get(index)
    }

    pub fn agent(&self, index: usize) -> Option<AgentView<'_>> {
        self.pedestrians.get(index).map(|p| AgentView::new(&self.store, p))
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentView<'_>> {
        self.pedestrians.iter().map(move |p| AgentView::new(&self.store, p))
    }

    pub fn on_step(&mut self, callback: impl FnMut() + 'static) {
        self.on_step.push(Box::new(callback));
    }

    pub fn on_agent_exit(&mut self, callback: impl FnMut(AgentView<'_>) + 'static) {
        self.on_exit.push(Box::new(callback));
    }

    pub fn on_finish(&mut self, callback: impl FnMut() + 'static) {
        self.on_finish.push(Box::new(callback));
    }

    /// Whether `point` may be occupied. With `at_start`, permeable
    /// obstacles such as the exit count as blocking.
    pub fn is_accessible(&self, point: &Point, at_start: bool) -> bool {
        accessible(&self.layout, &self.grid, point, at_start, self.logger.as_ref())
    }

    /// Live agents whose position did not change during the last tick.
    pub fn stationary_agents(&self) -> Vec<usize> {
        (0..self.store.len())
            .filter(|&i| self.store.is_alive(i) && self.store.position(i) == self.store.last_position(i))
            .collect()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.ticks,
            time: self.time,
            positions: self.store.positions().to_vec(),
            velocities: self.store.velocities().to_vec(),
            alive: self.store.alive().to_vec(),
        }
    }

    /// Advances the world by one time step. Does nothing once the scene is done.
    pub fn step(&mut self) {
        if self.status == SceneStatus::Done {
            return;
        }
        self.time += self.settings.dt;
        self.ticks += 1;
        self.store.advance(self.settings.dt);
        let moved = self.store.positions().to_vec();
        if self.settings.enforce_minimum_distance {
            self.enforce_minimum_distance();
        }
        self.update_cells();
        self.advance_routes(&moved);

        for callback in &mut self.on_step {
            callback();
        }
        if self.store.alive_count() == 0 {
            self.status = SceneStatus::Done;
            self.finish();
        }
    }

    /// Pairwise push-apart for agents sharing a cell and closer than the
    /// minimum distance. Corrections of all pairs are summed before any
    /// position changes.
    pub fn minimum_distance_corrections(&self) -> Vec<Point> {
        let minimum = self.settings.minimum_distance;
        let mut corrections = vec![Point::ORIGIN; self.store.len()];
        for cell in self.grid.cells() {
            let members: Vec<usize> = cell.agents().iter().copied().collect();
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    let difference = self.store.position(a) - self.store.position(b);
                    let distance = difference.norm();
                    if distance < minimum {
                        let push = difference * ((minimum / (distance + SEPARATION_EPS) - 1.0) / 2.0);
                        corrections[a] = corrections[a] + push;
                        corrections[b] = corrections[b] - push;
                    }
                }
            }
        }
        corrections
    }

    /// Applies the batched corrections. A correction that would put its agent
    /// outside the domain or inside a blocking obstacle is dropped.
    pub fn enforce_minimum_distance(&mut self) {
        let corrections = self.minimum_distance_corrections();
        for (index, correction) in corrections.into_iter().enumerate() {
            if correction.is_zero() {
                continue;
            }
            let corrected = self.store.position(index) + correction;
            if self.is_accessible(&corrected, false) {
                self.store.set_position(index, corrected);
            }
        }
    }

    fn update_cells(&mut self) {
        for index in 0..self.store.len() {
            if !self.store.is_alive(index) {
                continue;
            }
            let position = self.store.position(index);
            let floor = self.grid.floor_coord(&position);
            if floor == self.floor_coords[index] {
                continue;
            }
            self.floor_coords[index] = floor;
            // Outside the grid the agent stays registered where it was.
            let Some(coord) = self.grid.coord_of(&position) else {
                continue;
            };
            let Some(walker) = self.pedestrians[index].walker_mut() else {
                continue;
            };
            let previous = walker.cell();
            if previous == coord {
                continue;
            }
            walker.set_cell(coord);
            self.move_between_cells(index, previous, coord);
        }
    }

    fn move_between_cells(&mut self, index: usize, from: CellCoord, to: CellCoord) {
        if let Some(cell) = self.grid.cell_mut(from) {
            cell.remove_agent(index);
        }
        if let Some(cell) = self.grid.cell_mut(to) {
            cell.add_agent(index);
        }
    }

    /// Moves agents that reached their segment end on to the next segment.
    ///
    /// The end counts as reached when it is within one step of the agent
    /// either after the move (`moved`) or after the correction. Agents still
    /// on their way are re-aimed at the end, undoing any sideways push.
    fn advance_routes(&mut self, moved: &[Point]) {
        let dt = self.settings.dt;
        for index in 0..self.store.len() {
            if !self.store.is_alive(index) {
                continue;
            }
            let Some(target) = self.pedestrians[index].walker().map(|w| w.line().end()) else {
                continue;
            };
            let position = self.store.position(index);
            let reach = self.store.max_speed(index) * dt;
            if position.distance_to(&target) >= reach && moved[index].distance_to(&target) >= reach {
                self.store.set_velocity(index, target - position);
                continue;
            }
            if self.is_accessible(&target, false) {
                self.store.set_position(index, target);
            }

            let next = self.pedestrians[index].walker_mut().and_then(Walker::next_line);
            match next {
                Some(line) => {
                    let direction = line.end() - self.store.position(index);
                    self.store.set_velocity(index, direction);
                }
                None => self.retire(index),
            }
        }
    }

    /// Removes a finished agent from its cell and leaves a placeholder in its slot.
    fn retire(&mut self, index: usize) {
        let placeholder = self.pedestrians[index].placeholder();
        let retired = std::mem::replace(&mut self.pedestrians[index], placeholder);
        assert_eq!(retired.index(), index, "agent slot {} holds agent {}", index, retired.index());
        if let Some(walker) = retired.walker() {
            if let Some(cell) = self.grid.cell_mut(walker.cell()) {
                cell.remove_agent(index);
            }
        }
        self.store.retire(index);

        let view = AgentView::new(&self.store, &retired);
        for callback in &mut self.on_exit {
            callback(view);
        }
    }

    /// Fires finish callbacks. Only the first call has an effect.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for callback in &mut self.on_finish {
            callback();
        }
        self.logger.info("Simulation is finished. Exiting");
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

fn plan_all(planner: &dyn RoutePlanner, positions: &[Point]) -> DomainResult<Vec<Path>> {
    positions
        .iter()
        .enumerate()
        .map(|(agent, &start)| planner.plan(agent, start))
        .collect()
}
