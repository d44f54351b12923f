use crate::domains::grid::CacheMode;
use crate::domains::planning::PlannerSettings;

/// Everything a scene needs besides its obstacles.
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub pedestrians: usize,
    pub dt: f64,
    pub max_speed: f64,
    /// Per-agent max speed is drawn from `max_speed ± max_speed_spread`.
    pub max_speed_spread: f64,
    pub minimum_distance: f64,
    pub enforce_minimum_distance: bool,
    pub cells_x: usize,
    pub cells_y: usize,
    pub cache_mode: CacheMode,
    pub cache_name: String,
    pub spawn_attempts: usize,
    pub planner: PlannerSettings,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            pedestrians: 300,
            dt: 0.05,
            max_speed: 5.0,
            max_speed_spread: 0.0,
            minimum_distance: 0.7,
            enforce_minimum_distance: true,
            cells_x: 20,
            cells_y: 20,
            cache_mode: CacheMode::Read,
            cache_name: "cells.bin".to_string(),
            spawn_attempts: 10_000,
            planner: PlannerSettings::default(),
        }
    }
}
