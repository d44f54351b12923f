mod common;

use common::block_room_json;
use crowd_sim::adapters::inbound::FilesystemLayoutSource;
use crowd_sim::adapters::outbound::{init_noop_logger, FilesystemGridCache, MemoryGridCache};
use crowd_sim::application::SimulationService;
use crowd_sim::domains::grid::CacheMode;
use crowd_sim::{ApplicationError, Config, DomainError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn room_config(obstacle_file: &str) -> Config {
    let mut config = Config::default();
    config.domain.width = 10.0;
    config.domain.height = 10.0;
    config.simulation.pedestrians = 10;
    config.simulation.seed = Some(11);
    config.simulation.max_ticks = Some(20_000);
    config.grid.cells_x = 2;
    config.grid.cells_y = 2;
    config.layout.obstacle_file = obstacle_file.to_string();
    config
}

fn service(config: Config, data_dir: &Path) -> SimulationService {
    let cache_dir = data_dir.join("cache");
    SimulationService::new(
        config,
        Arc::new(FilesystemLayoutSource::new(Some(data_dir.to_path_buf()))),
        Arc::new(FilesystemGridCache::new(Some(cache_dir))),
        init_noop_logger(),
    )
}

#[test]
fn runs_a_scene_until_everyone_has_left() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("room.json"), block_room_json()).unwrap();
    let mut config = room_config("room.json");
    config.simulation.record_trajectories = true;

    let report = service(config, dir.path()).run().unwrap();

    assert!(report.completed);
    assert_eq!(report.agents, 10);
    assert_eq!(report.exited(), 10);
    assert!(report.exits.windows(2).all(|w| w[0].tick <= w[1].tick));
    assert_eq!(report.frames.len() as u64, report.ticks + 1);
    assert!(report.frames.last().unwrap().alive.iter().all(|a| !a));
    assert!((report.simulated_time - report.ticks as f64 * 0.05).abs() < 1e-9);
    assert!(dir.path().join("cache").join("cells.bin").exists());
}

#[test]
fn tick_ceiling_stops_an_unfinished_scene() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("room.json"), block_room_json()).unwrap();
    let mut config = room_config("room.json");
    config.simulation.max_ticks = Some(3);
    config.grid.cache = CacheMode::Off;

    let report = service(config, dir.path()).run().unwrap();
    assert!(!report.completed);
    assert_eq!(report.ticks, 3);
    assert!(report.frames.is_empty());
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn seeded_runs_are_identical() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("room.json"), block_room_json()).unwrap();
    let run = || {
        let config = room_config("room.json");
        SimulationService::new(
            config,
            Arc::new(FilesystemLayoutSource::new(Some(dir.path().to_path_buf()))),
            Arc::new(MemoryGridCache::new()),
            init_noop_logger(),
        )
        .run()
        .unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.ticks, b.ticks);
    assert_eq!(a.exits, b.exits);
}

#[test]
fn layout_without_exit_fails_the_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("closed.json"), r#"{ "obstacles": [] }"#).unwrap();
    let err = service(room_config("closed.json"), dir.path()).run().unwrap_err();
    assert!(matches!(err, ApplicationError::Domain(DomainError::MissingExit { .. })));
}

#[test]
fn config_file_is_overlaid_by_environment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [simulation]
        pedestrians = 40
        dt = 0.1

        [grid]
        cache = "write"
        "#,
    )
    .unwrap();

    let from_file = Config::from_file(&path).unwrap();
    assert_eq!(from_file.simulation.pedestrians, 40);
    assert_eq!(from_file.grid.cache, CacheMode::Write);

    std::env::set_var("CROWD_SIMULATION__PEDESTRIANS", "17");
    let layered = Config::load(Some(&path)).unwrap();
    std::env::remove_var("CROWD_SIMULATION__PEDESTRIANS");
    assert_eq!(layered.simulation.pedestrians, 17);
    assert_eq!(layered.simulation.dt, 0.1);
    assert_eq!(layered.grid.cache, CacheMode::Write);
    assert_eq!(layered.domain.width, 250.0);
}
