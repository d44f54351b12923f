use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("No exit specified in {source_name}")]
    MissingExit { source_name: String },

    #[error("Multiple exits ({count}) specified in {source_name}; only one is supported")]
    MultipleExits { source_name: String, count: usize },

    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("No path could be found from agent {agent} at ({x:.2}, {y:.2}) to the exit")]
    NoRoute { agent: usize, x: f64, y: f64 },

    #[error("Disconnected path: {reason}")]
    DisconnectedPath { reason: String },

    #[error("Detour for agent {agent} did not reach the exit within {steps} steps")]
    DetourLimit { agent: usize, steps: usize },

    #[error("No accessible spawn point found for agent {agent} after {attempts} attempts")]
    SpawnFailed { agent: usize, attempts: usize },

    #[error("Grid cache format error: {reason}")]
    CacheFormat { reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(#[from] bincode::Error),

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
