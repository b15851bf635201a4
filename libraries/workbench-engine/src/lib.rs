//! Peak vs RMS compressor workbench engine
//!
//! Ties the compressors, metrics, and export together:
//! - [`MetricsExtractionEngine`]: offline runs over whole files
//! - [`RealtimeProcessor`]: the live callback path sharing the same compressors
//! - [`ParameterStore`]: lock-free parameters read by both paths
//! - [`DataExporter`]: report and WAV output
//! - [`WorkbenchConfig`]: layered TOML/environment configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use workbench_engine::{
//!     MetricsExtractionEngine, ParameterStore, SharedCompressors, WorkbenchConfig,
//! };
//!
//! let config = WorkbenchConfig::load()?;
//! let compressors = SharedCompressors::new();
//! let params = Arc::new(ParameterStore::new());
//! params.apply_preset(1)?;
//!
//! let engine = MetricsExtractionEngine::new(config, compressors, params)?;
//! let run = engine.run(Path::new("drums.wav"))?;
//! println!("{}", run.report);
//! # Ok::<(), workbench_engine::EngineError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod engine;
mod error;
mod exporter;
mod params;
mod presets;
mod processor;
mod status;

pub use config::{EngineSettings, ExportSettings, WorkbenchConfig, DEFAULT_FOLDER_NAME};
pub use engine::{MetricsExtractionEngine, RunReport};
pub use error::{EngineError, Result};
pub use exporter::{unique_file_path, write_wav, DataExporter};
pub use params::{ParameterInfo, ParameterStore, IS_RMS, MUTE, PARAMETERS, POWER};
pub use presets::{preset, preset_by_name, Preset, PRESETS};
pub use processor::{MeterReadings, RealtimeProcessor, SharedCompressors};
pub use status::{EngineState, EngineStatus, RunOutcome};
