//! Error types for metrics extraction

use crate::record::SignalRole;
use thiserror::Error;

/// Result type for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors that can occur while extracting metrics
#[derive(Error, Debug)]
pub enum MetricsError {
    /// `prepare` has not been called with a usable sample rate
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// A buffer needed for the extraction was not supplied
    #[error("{0} was not supplied")]
    MissingSignal(SignalRole),

    /// One of the input buffers holds no samples
    #[error("{0} is empty")]
    EmptySignal(SignalRole),

    /// One of the input buffers differs in shape from the uncompressed signal
    #[error(
        "{what} has shape {found_channels}x{found_samples}, expected {expected_channels}x{expected_samples}"
    )]
    ShapeMismatch {
        what: &'static str,
        expected_channels: usize,
        expected_samples: usize,
        found_channels: usize,
        found_samples: usize,
    },

    /// EBU R128 reference measurement error
    #[error("EBU R128 analysis failed: {0}")]
    Loudness(String),
}

impl From<ebur128::Error> for MetricsError {
    fn from(err: ebur128::Error) -> Self {
        Self::Loudness(format!("{:?}", err))
    }
}
