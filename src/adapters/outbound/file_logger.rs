use crate::domains::logger::{DynLogger, FileLogger};
use std::sync::Arc;

/// Initializes `fast_log` writing to `path` and returns the logger to inject.
pub fn init_file_logger(path: &str) -> Result<DynLogger, String> {
    FileLogger::init(path, log::LevelFilter::Info).map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger))
}
