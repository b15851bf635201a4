//! Peak/RMS Compressor Workbench Core
//!
//! Platform-agnostic types, traits, and error handling shared by the DSP,
//! metrics, and engine crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: planar `AudioBuffer`, `ProcessSpec`, `LoadedAudio`
//! - **Compression Types**: `CompressorParameters`, `DetectionMode`
//! - **Collaborator Traits**: `AudioLoader`, `ReportExporter`, `ParameterSource`
//! - **Error Handling**: unified `WorkbenchError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use workbench_core::{AudioBuffer, DetectionMode, ProcessSpec};
//!
//! let mut buffer = AudioBuffer::new(2, 512);
//! buffer.channel_mut(0)[0] = 0.5;
//!
//! let spec = ProcessSpec::new(44_100.0, 512, 2);
//! assert_eq!(buffer.num_samples(), spec.block_size as usize);
//! assert_eq!(DetectionMode::Rms.param_prefix(), "rms_");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use error::{Result, WorkbenchError};
pub use traits::{AudioLoader, ParameterSource, ReportExporter};
pub use types::{
    AudioBuffer, CompressorParameters, DetectionMode, ExportSummary, LoadedAudio, ProcessSpec,
};
