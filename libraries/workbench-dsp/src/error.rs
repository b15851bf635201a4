/// DSP and decoding errors
use thiserror::Error;
use workbench_core::WorkbenchError;

/// Result type alias using `DspError`
pub type Result<T> = std::result::Result<T, DspError>;

/// DSP error types
#[derive(Error, Debug)]
pub enum DspError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported container or codec
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Only mono and stereo are accepted
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannelCount(usize),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl From<symphonia::core::errors::Error> for DspError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        match err {
            symphonia::core::errors::Error::Unsupported(what) => {
                DspError::UnsupportedFormat(what.to_string())
            }
            other => DspError::Symphonia(other.to_string()),
        }
    }
}

impl From<DspError> for WorkbenchError {
    fn from(err: DspError) -> Self {
        match err {
            DspError::FileNotFound(path) => WorkbenchError::FileNotFound(path.into()),
            DspError::UnsupportedChannelCount(n) => WorkbenchError::UnsupportedChannelCount(n),
            DspError::Io(e) => WorkbenchError::Io(e),
            other => WorkbenchError::decode(other.to_string()),
        }
    }
}
