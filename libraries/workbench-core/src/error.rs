/// Core error types for the workbench
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `WorkbenchError`
pub type Result<T> = std::result::Result<T, WorkbenchError>;

/// Core error type shared by every collaborator boundary
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Only mono and stereo material is supported
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannelCount(usize),

    /// Audio decoding errors
    #[error("Decode error: {0}")]
    Decode(String),

    /// Report or audio export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Buffer construction or parameter errors
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WorkbenchError {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
