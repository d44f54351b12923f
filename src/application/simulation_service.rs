use crate::common::ApplicationResult;
use crate::config::Config;
use crate::domains::grid::GridCacheStore;
use crate::domains::logger::DynLogger;
use crate::domains::obstacles::{LayoutSource, ObstacleLayout};
use crate::domains::scene::{Frame, Scene, SceneStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

const PROGRESS_EVERY: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitRecord {
    pub agent: usize,
    pub tick: u64,
    pub time: f64,
}

/// Outcome of one driven scene.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scene_id: Uuid,
    pub agents: usize,
    pub ticks: u64,
    pub simulated_time: f64,
    pub elapsed: Duration,
    /// Whether every agent left before the tick ceiling.
    pub completed: bool,
    pub exits: Vec<ExitRecord>,
    pub frames: Vec<Frame>,
}

impl SimulationReport {
    pub fn exited(&self) -> usize {
        self.exits.len()
    }
}

/// Loads a layout, builds a scene and drives it to completion.
pub struct SimulationService {
    config: Config,
    layout_source: Arc<dyn LayoutSource>,
    grid_cache: Arc<dyn GridCacheStore>,
    logger: DynLogger,
}

impl SimulationService {
    pub fn new(
        config: Config,
        layout_source: Arc<dyn LayoutSource>,
        grid_cache: Arc<dyn GridCacheStore>,
        logger: DynLogger,
    ) -> Self {
        Self {
            config,
            layout_source,
            grid_cache,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_layout(&self) -> ApplicationResult<ObstacleLayout> {
        let domain = self.config.domain_size()?;
        let name = &self.config.layout.obstacle_file;
        let document = self.layout_source.load_layout(name)?;
        let layout = ObstacleLayout::from_document(&document, domain, self.config.planner.corner_margin, name)?;
        self.logger.info(&format!(
            "Loaded {} obstacles from {} (exit {})",
            layout.obstacles().len(),
            name,
            layout.exit().name()
        ));
        Ok(layout)
    }

    pub fn build_scene(&self) -> ApplicationResult<Scene> {
        let layout = self.load_layout()?;
        let settings = self.config.scene_settings();
        let mut rng = match self.config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Scene::new(settings, layout, self.grid_cache.as_ref(), &mut rng, self.logger.clone())?)
    }

    pub fn run(&self) -> ApplicationResult<SimulationReport> {
        let scene = self.build_scene()?;
        Ok(self.run_scene(scene))
    }

    /// Steps `scene` until it is done or the configured tick ceiling is hit.
    pub fn run_scene(&self, mut scene: Scene) -> SimulationReport {
        let started = Instant::now();
        let pending: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pending);
        scene.on_agent_exit(move |agent| sink.borrow_mut().push(agent.index()));

        let max_ticks = self.config.simulation.max_ticks;
        let record = self.config.simulation.record_trajectories;
        let mut exits = Vec::new();
        let mut frames = Vec::new();
        if record {
            frames.push(scene.frame());
        }

        while scene.status() == SceneStatus::Running {
            if max_ticks.is_some_and(|limit| scene.ticks() >= limit) {
                self.logger.warn(&format!(
                    "Stopping after {} ticks with {} agents still walking",
                    scene.ticks(),
                    scene.alive_count()
                ));
                break;
            }
            scene.step();
            exits.extend(pending.borrow_mut().drain(..).map(|agent| ExitRecord {
                agent,
                tick: scene.ticks(),
                time: scene.time(),
            }));
            if record {
                frames.push(scene.frame());
            }
            if scene.ticks() % PROGRESS_EVERY == 0 {
                self.logger.info(&format!(
                    "Tick {} (t = {:.2}): {} agents walking",
                    scene.ticks(),
                    scene.time(),
                    scene.alive_count()
                ));
            }
        }
        scene.finish();

        SimulationReport {
            scene_id: scene.id(),
            agents: scene.agent_count(),
            ticks: scene.ticks(),
            simulated_time: scene.time(),
            elapsed: started.elapsed(),
            completed: scene.status() == SceneStatus::Done,
            exits,
            frames,
        }
    }
}
