/// Collaborator traits consumed by the extraction engine
use crate::error::Result;
use crate::types::{AudioBuffer, ExportSummary, LoadedAudio};
use std::path::Path;

/// Audio file loader
///
/// Implementers decode a whole file into memory. Only mono and stereo
/// material has to be supported; other channel counts are rejected with
/// [`WorkbenchError::UnsupportedChannelCount`](crate::WorkbenchError::UnsupportedChannelCount).
pub trait AudioLoader: Send {
    /// Decode the file at `path`
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable, or not mono/stereo
    fn load(&self, path: &Path) -> Result<LoadedAudio>;

    /// Check if the loader supports the given file format
    fn supports_format(&self, path: &Path) -> bool;
}

/// Sink for one run's report and compressed audio
///
/// Writes are not transactional: files written before a failure stay on disk.
pub trait ReportExporter: Send {
    /// Write the report and, when enabled, both compressed buffers
    ///
    /// `input` identifies the analysed file and is used to derive output names.
    ///
    /// # Errors
    /// Returns an error if any file cannot be written
    fn export_all(
        &mut self,
        input: &Path,
        report: &str,
        peak: Option<&AudioBuffer>,
        rms: Option<&AudioBuffer>,
        sample_rate: f64,
    ) -> Result<ExportSummary>;
}

/// Read-only view of a live key/value parameter store
pub trait ParameterSource: Send + Sync {
    /// Current value for `key`, or `None` if the key is unknown
    fn value(&self, key: &str) -> Option<f32>;
}
