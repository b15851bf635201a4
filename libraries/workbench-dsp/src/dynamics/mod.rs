//! Feed-forward dynamics processing
//!
//! The compressor chain is split into its classic stages:
//! - [`GainComputer`]: static threshold/ratio/knee curve (dB in, dB out)
//! - [`LevelDetector`]: branching attack/release ballistics
//! - [`ControlSignal`]: the sidechain buffer, tagged with its current domain
//!
//! [`Compressor`] wires them together in the order dictated by its
//! [`DetectionMode`](workbench_core::DetectionMode).

mod compressor;
mod control;
mod detector;
mod envelope;
mod gain_computer;

pub use compressor::{Compressor, CompressorPair};
pub use control::{ControlSignal, SignalDomain};
pub use detector::LevelDetector;
pub use envelope::LevelEnvelopeFollower;
pub use gain_computer::GainComputer;
