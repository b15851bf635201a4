//! Loudness, dynamics, and gain-reduction metrics for the compressor workbench
//!
//! This crate provides:
//! - Per-signal descriptors (peak, gated mean energy, RMS, crest factor,
//!   K-weighted integrated loudness, loudness range)
//! - Compression impact figures comparing a compressed signal with its source
//! - Statistics over the compressor's linear gain-reduction signal
//! - An EBU R128 reference measurement as a cross-check
//! - Plain-text report formatting
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ MetricsInput │ ──► │   Metrics    │ ──► │ CompressionMetrics │ x3
//! │  (5 buffers) │     │ (calculator) │     └────────────────────┘
//! └──────────────┘     └──────────────┘               │
//!                                                     ▼
//!                                              ┌──────────────┐
//!                                              │ build_report │
//!                                              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use workbench_core::AudioBuffer;
//! use workbench_metrics::{Metrics, MetricsInput};
//!
//! let source = AudioBuffer::from_channels(vec![vec![0.25; 8_000]]).unwrap();
//! let unity = AudioBuffer::from_channels(vec![vec![1.0; 8_000]]).unwrap();
//!
//! let mut metrics = Metrics::default();
//! metrics.prepare(8_000.0);
//! metrics
//!     .extract_metrics(
//!         &MetricsInput::new(&source)
//!             .with_peak(&source, &unity)
//!             .with_rms(&source, &unity),
//!     )
//!     .unwrap();
//!
//! assert!((metrics.uncompressed_metrics().signal.peak - 0.25).abs() < 1e-6);
//! ```

#![forbid(unsafe_code)]

mod calculator;
mod config;
mod error;
mod gain_reduction;
mod impact;
mod k_weighting;
mod record;
mod reference;
mod report;
mod signal;

pub use calculator::{Metrics, MetricsInput};
pub use config::MetricsConfig;
pub use error::{MetricsError, Result};
pub use gain_reduction::gain_reduction_stats;
pub use impact::{
    correlation, harmonic_distortion, impact_metrics, rmse, transient_energy_preservation,
    transient_impact, transient_strength,
};
pub use k_weighting::{apply_k_weighting, KWeightingFilter};
pub use record::{
    CompressionMetrics, GainReductionStats, ImpactMetrics, SignalMetrics, SignalRole,
};
pub use reference::{measure_reference, ReferenceLoudness};
pub use report::{build_report, format_parameter_block};
pub use signal::{
    crest_factor_db, integrated_loudness, loudness_range, mean_square_energy, signal_metrics,
    LUFS_OFFSET_DB,
};
