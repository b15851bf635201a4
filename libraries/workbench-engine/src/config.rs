/// Workbench configuration
///
/// Loaded in layers: built-in defaults, an optional TOML file, then
/// `WORKBENCH_`-prefixed environment variables with `__` between nested
/// keys (e.g. `WORKBENCH_EXPORT__BIT_DEPTH=16`).
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use workbench_metrics::MetricsConfig;

/// Default output folder created under `export.base_directory`
pub const DEFAULT_FOLDER_NAME: &str = "PeakRMSCompressorWorkbench_testing_results";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Samples per offline compression chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Longest accepted input in minutes; 0 disables the limit
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportSettings {
    /// Directory the output folder is created in
    #[serde(default = "default_base_directory")]
    pub base_directory: PathBuf,

    #[serde(default = "default_folder_name")]
    pub folder_name: String,

    /// Write the compressed audio next to the report
    #[serde(default = "default_export_wavs")]
    pub export_wavs: bool,

    /// 16 or 24 (integer PCM) or 32 (float)
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_duration_minutes: default_max_duration_minutes(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            folder_name: default_folder_name(),
            export_wavs: default_export_wavs(),
            bit_depth: default_bit_depth(),
        }
    }
}

impl ExportSettings {
    /// Folder every output file is written to
    pub fn output_folder(&self) -> PathBuf {
        self.base_directory.join(&self.folder_name)
    }
}

impl WorkbenchConfig {
    /// Load from `workbench.toml` in the working directory (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("workbench.toml"))
    }

    /// Load from `path` (if it exists) and the environment, then validate
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("WORKBENCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.chunk_size == 0 {
            return Err(EngineError::config("engine.chunk_size must be at least 1"));
        }

        if self.engine.max_duration_minutes.is_nan() || self.engine.max_duration_minutes < 0.0 {
            return Err(EngineError::config(
                "engine.max_duration_minutes must not be negative",
            ));
        }

        if !matches!(self.export.bit_depth, 16 | 24 | 32) {
            return Err(EngineError::config(format!(
                "export.bit_depth must be 16, 24 or 32, got {}",
                self.export.bit_depth
            )));
        }

        if self.export.folder_name.trim().is_empty() {
            return Err(EngineError::config("export.folder_name must not be empty"));
        }

        self.metrics
            .validate()
            .map_err(|e| EngineError::config(format!("metrics: {e}")))
    }
}

// Default values
fn default_chunk_size() -> usize {
    1024
}

fn default_max_duration_minutes() -> f64 {
    20.0
}

fn default_base_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_folder_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

fn default_export_wavs() -> bool {
    true
}

fn default_bit_depth() -> u16 {
    24
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = WorkbenchConfig::default();
        assert_eq!(config.engine.chunk_size, 1024);
        assert_eq!(config.engine.max_duration_minutes, 20.0);
        assert_eq!(config.export.bit_depth, 24);
        assert!(config.export.export_wavs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[engine]\nchunk_size = 512\n\n[metrics]\ntransient_percentile = 75.0\n\n[export]\nexport_wavs = false\nbit_depth = 16"
        )
        .unwrap();

        let config = WorkbenchConfig::load_from(file.path()).unwrap();
        assert_eq!(config.engine.chunk_size, 512);
        assert_eq!(config.engine.max_duration_minutes, 20.0);
        assert_eq!(config.metrics.transient_percentile, 75.0);
        assert_eq!(config.metrics.window_seconds, 0.4);
        assert!(!config.export.export_wavs);
        assert_eq!(config.export.bit_depth, 16);
        assert_eq!(config.export.folder_name, DEFAULT_FOLDER_NAME);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkbenchConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, WorkbenchConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = WorkbenchConfig::default();
        config.export.bit_depth = 20;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = WorkbenchConfig::default();
        config.engine.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = WorkbenchConfig::default();
        config.metrics.hop_seconds = -1.0;
        assert!(config.validate().is_err());
    }
}
