/// Engine error types
use std::path::PathBuf;
use thiserror::Error;
use workbench_core::WorkbenchError;
use workbench_metrics::MetricsError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("An extraction run is already in progress")]
    AlreadyProcessing,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error(
        "{} is {:.1} minutes long, the limit is {:.1} minutes",
        .path.display(),
        .duration_minutes,
        .limit_minutes
    )]
    TooLong {
        path: PathBuf,
        duration_minutes: f64,
        limit_minutes: f64,
    },

    #[error(transparent)]
    Workbench(#[from] WorkbenchError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(u8),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
