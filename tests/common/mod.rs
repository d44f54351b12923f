#![allow(dead_code)]

use crowd_sim::domains::geometry::{Point, Size};
use crowd_sim::domains::grid::{CacheMode, GridIndex};
use crowd_sim::domains::obstacles::{Obstacle, ObstacleKind, ObstacleLayout};
use crowd_sim::domains::planning::PlannerSettings;
use crowd_sim::domains::scene::SceneSettings;
use crowd_sim::adapters::outbound::init_noop_logger;

pub fn size(width: f64, height: f64) -> Size {
    Size::new(width, height).unwrap()
}

/// 10 x 10 room with a 2 x 2 block in the middle and an exit on the right wall.
pub fn block_room() -> ObstacleLayout {
    let block = Obstacle::new("block", ObstacleKind::Generic, Point::new(4.0, 4.0), size(2.0, 2.0), 1.0);
    let exit = Obstacle::new("exit", ObstacleKind::Exit, Point::new(9.0, 4.5), size(1.0, 1.0), 1.0);
    ObstacleLayout::new(size(10.0, 10.0), vec![block], exit).unwrap()
}

pub fn block_room_json() -> &'static str {
    r#"{
  "obstacles": [ { "name": "block", "begin": [0.4, 0.4], "size": [0.2, 0.2] } ],
  "exits": [ { "name": "exit", "begin": [0.9, 0.45], "size": [0.0, 0.0] } ]
}"#
}

pub fn room_settings(pedestrians: usize) -> SceneSettings {
    SceneSettings {
        pedestrians,
        dt: 0.05,
        max_speed: 5.0,
        max_speed_spread: 0.0,
        minimum_distance: 0.7,
        enforce_minimum_distance: true,
        cells_x: 2,
        cells_y: 2,
        cache_mode: CacheMode::Off,
        cache_name: "cells.bin".to_string(),
        spawn_attempts: 10_000,
        planner: PlannerSettings::default(),
    }
}

pub fn room_grid(layout: &ObstacleLayout) -> GridIndex {
    GridIndex::build(layout, 2, 2, init_noop_logger().as_ref()).unwrap()
}

pub fn assert_close(a: Point, b: Point) {
    assert!(a.distance_to(&b) < 1e-9, "{} != {}", a, b);
}
