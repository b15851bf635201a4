//! Peak/RMS Compressor Workbench DSP
//!
//! Feed-forward dynamics processing and audio file loading.
//!
//! This crate provides:
//! - A branching one-pole `LevelDetector` with peak and RMS variants
//! - A soft-knee `GainComputer`
//! - A `Compressor` fixed to one detection mode, and a `CompressorPair`
//!   holding one compressor per mode with independent parameters
//! - A peak `LevelEnvelopeFollower` for input/output metering
//! - Audio file loading via Symphonia (WAV, FLAC, MP3, OGG, AAC)
//!
//! # Example: Offline Compression
//!
//! ```rust
//! use workbench_core::{AudioBuffer, CompressorParameters, ProcessSpec};
//! use workbench_dsp::CompressorPair;
//!
//! let mut pair = CompressorPair::new();
//! pair.prepare(ProcessSpec::new(44_100.0, 512, 2));
//! pair.peak_mut().set_parameters(&CompressorParameters {
//!     threshold_db: -12.0,
//!     ratio: 4.0,
//!     ..CompressorParameters::default()
//! });
//!
//! let mut chunk = AudioBuffer::new(2, 512);
//! chunk.channel_mut(0).fill(0.9);
//! chunk.channel_mut(1).fill(0.9);
//! pair.apply_peak_compression(&mut chunk, 512, 2, true);
//!
//! assert!(pair.peak().max_gain_reduction() < 0.0);
//! assert_eq!(pair.peak().gain_reduction_signal().num_samples(), 512);
//! ```

pub mod dynamics;
mod error;
mod loader;

pub use dynamics::{
    Compressor, CompressorPair, ControlSignal, GainComputer, LevelDetector,
    LevelEnvelopeFollower, SignalDomain,
};
pub use error::{DspError, Result};
pub use loader::SymphoniaLoader;
