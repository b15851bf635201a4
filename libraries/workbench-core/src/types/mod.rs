mod audio;
mod compression;

pub use audio::{AudioBuffer, ExportSummary, LoadedAudio, ProcessSpec};
pub use compression::{CompressorParameters, DetectionMode};
