use super::{init_console_logger, init_file_logger, init_noop_logger};
use crate::config::{LogLevel, LoggingConfig};
use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards every record to all attached loggers.
pub struct MultiLogger {
    targets: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(targets: Vec<DynLogger>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// File logger with the console attached. Falls back to the console alone
/// when the file logger cannot be initialized.
pub fn init_combined_logger(path: &str) -> DynLogger {
    let console = init_console_logger();
    match init_file_logger(path) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])),
        Err(e) => {
            console.warn(&e);
            console
        }
    }
}

/// Picks the logger matching the configured verbosity.
pub fn logger_for(config: &LoggingConfig) -> DynLogger {
    match (config.level, config.file.as_deref()) {
        (LogLevel::Quiet, _) => init_noop_logger(),
        (LogLevel::Normal, Some(path)) => init_combined_logger(path),
        (LogLevel::Normal, None) => init_console_logger(),
    }
}
