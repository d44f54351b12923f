use crate::common::DomainResult;
use crate::domains::geometry::Size;
use crate::domains::grid::CacheMode;
use crate::domains::planning::{PlannerKind, PlannerSettings, PlanningAlgorithm};
use crate::domains::scene::SceneSettings;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain: DomainConfig,
    pub simulation: SimulationConfig,
    pub grid: GridConfig,
    pub planner: PlannerConfig,
    pub layout: LayoutConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub pedestrians: usize,
    pub dt: f64,
    pub max_speed: f64,
    pub max_speed_spread: f64,
    pub minimum_distance: f64,
    pub enforce_minimum_distance: bool,
    /// Fixed seed for reproducible spawning; random when absent.
    pub seed: Option<u64>,
    /// Stop driving the scene after this many ticks even if agents remain.
    pub max_ticks: Option<u64>,
    pub record_trajectories: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cells_x: usize,
    pub cells_y: usize,
    pub cache: CacheMode,
    pub cache_path: String,
    /// Directory holding the cache file. Falls back to `CROWD_CACHE_DIR`.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub kind: PlannerKind,
    pub algorithm: PlanningAlgorithm,
    pub corner_margin: f64,
    pub detour_margin: f64,
    pub max_detour_steps: usize,
    pub spawn_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub obstacle_file: String,
    /// Directory holding layout files. Falls back to `CROWD_DATA_DIR`.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            width: 250.0,
            height: 150.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pedestrians: 300,
            dt: 0.05,
            max_speed: 5.0,
            max_speed_spread: 0.0,
            minimum_distance: 0.7,
            enforce_minimum_distance: true,
            seed: None,
            max_ticks: None,
            record_trajectories: false,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cells_x: 20,
            cells_y: 20,
            cache: CacheMode::Read,
            cache_path: "cells.bin".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let planner = PlannerSettings::default();
        Self {
            kind: planner.kind,
            algorithm: planner.algorithm,
            corner_margin: planner.corner_margin,
            detour_margin: planner.detour_margin,
            max_detour_steps: planner.max_detour_steps,
            spawn_attempts: 10_000,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            obstacle_file: "obstacles.json".to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Optional toml file overlaid with `CROWD_` environment variables,
    /// e.g. `CROWD_SIMULATION__PEDESTRIANS=50`.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            let path = path.as_ref().to_string_lossy().into_owned();
            builder = builder.add_source(config::File::new(&path, config::FileFormat::Toml));
        }
        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("CROWD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.domain.width > 0.0 && self.domain.height > 0.0,
            "domain must have a positive size"
        );
        ensure!(self.simulation.dt > 0.0, "simulation.dt must be positive");
        ensure!(self.simulation.max_speed > 0.0, "simulation.max_speed must be positive");
        ensure!(
            self.simulation.max_speed_spread >= 0.0 && self.simulation.max_speed_spread < self.simulation.max_speed,
            "simulation.max_speed_spread must lie in [0, max_speed)"
        );
        ensure!(
            self.simulation.minimum_distance >= 0.0,
            "simulation.minimum_distance must not be negative"
        );
        ensure!(
            self.grid.cells_x > 0 && self.grid.cells_y > 0,
            "grid needs at least one cell per axis"
        );
        ensure!(self.planner.spawn_attempts > 0, "planner.spawn_attempts must be positive");
        Ok(())
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            kind: self.planner.kind,
            algorithm: self.planner.algorithm,
            corner_margin: self.planner.corner_margin,
            detour_margin: self.planner.detour_margin,
            max_detour_steps: self.planner.max_detour_steps,
        }
    }

    pub fn domain_size(&self) -> DomainResult<Size> {
        Size::new(self.domain.width, self.domain.height)
    }

    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            pedestrians: self.simulation.pedestrians,
            dt: self.simulation.dt,
            max_speed: self.simulation.max_speed,
            max_speed_spread: self.simulation.max_speed_spread,
            minimum_distance: self.simulation.minimum_distance,
            enforce_minimum_distance: self.simulation.enforce_minimum_distance,
            cells_x: self.grid.cells_x,
            cells_y: self.grid.cells_y,
            cache_mode: self.grid.cache,
            cache_name: self.grid.cache_path.clone(),
            spawn_attempts: self.planner.spawn_attempts,
            planner: self.planner_settings(),
        }
    }
}
