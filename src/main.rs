use crowd_sim::adapters::inbound::FilesystemLayoutSource;
use crowd_sim::adapters::outbound::{logger_for, FilesystemGridCache};
use crowd_sim::application::SimulationService;
use crowd_sim::Config;
use std::env;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting crowd simulation");

    let config_path = env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(Some(&config_path))?
    } else {
        info!("{} not found, using defaults", config_path);
        Config::load(None::<&str>)?
    };

    info!("Configuration loaded successfully");
    info!(
        "Domain {}x{}, {} pedestrians, dt = {}",
        config.domain.width, config.domain.height, config.simulation.pedestrians, config.simulation.dt
    );
    info!("Layout file: {}", config.layout.obstacle_file);

    let logger = logger_for(&config.logging);
    let layout_source = Arc::new(FilesystemLayoutSource::new(config.layout.data_dir.clone()));
    let grid_cache = Arc::new(FilesystemGridCache::new(config.grid.cache_dir.clone()));
    let service = SimulationService::new(config, layout_source, grid_cache, logger);

    match service.run() {
        Ok(report) => {
            info!(
                "Scene {} finished after {} ticks ({:.2} s simulated, {:?} wall clock)",
                report.scene_id, report.ticks, report.simulated_time, report.elapsed
            );
            info!("{} of {} agents reached the exit", report.exited(), report.agents);
            if !report.frames.is_empty() {
                info!("Recorded {} frames", report.frames.len());
            }
        }
        Err(e) => {
            error!("Simulation failed: {}", e);
            return Err(e.into());
        }
    }

    info!("Shutting down crowd simulation");
    Ok(())
}
