//! Analysis constants, overridable through the workbench configuration

use serde::{Deserialize, Serialize};

/// Windowing, percentile, and gating settings for metric extraction
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Loudness window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: f64,

    /// Hop between loudness windows in seconds
    #[serde(default = "default_hop_seconds")]
    pub hop_seconds: f64,

    /// Lower percentile of the loudness range
    #[serde(default = "default_lra_low_percentile")]
    pub lra_low_percentile: f64,

    /// Upper percentile of the loudness range
    #[serde(default = "default_lra_high_percentile")]
    pub lra_high_percentile: f64,

    /// Percentile used for transient strength and transient window selection
    #[serde(default = "default_transient_percentile")]
    pub transient_percentile: f64,

    /// Samples quieter than this (linear) are left out of mean energy
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,
}

fn default_window_seconds() -> f64 {
    0.4
}

fn default_hop_seconds() -> f64 {
    0.2
}

fn default_lra_low_percentile() -> f64 {
    10.0
}

fn default_lra_high_percentile() -> f64 {
    95.0
}

fn default_transient_percentile() -> f64 {
    50.0
}

fn default_silence_threshold() -> f64 {
    0.0001
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            hop_seconds: default_hop_seconds(),
            lra_low_percentile: default_lra_low_percentile(),
            lra_high_percentile: default_lra_high_percentile(),
            transient_percentile: default_transient_percentile(),
            silence_threshold: default_silence_threshold(),
        }
    }
}

impl MetricsConfig {
    /// Check that every value is usable
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_seconds.is_nan() || self.window_seconds <= 0.0 {
            return Err(format!(
                "window_seconds must be positive, got {}",
                self.window_seconds
            ));
        }
        if self.hop_seconds.is_nan() || self.hop_seconds <= 0.0 {
            return Err(format!("hop_seconds must be positive, got {}", self.hop_seconds));
        }
        for (name, value) in [
            ("lra_low_percentile", self.lra_low_percentile),
            ("lra_high_percentile", self.lra_high_percentile),
            ("transient_percentile", self.transient_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{name} must be within 0..=100, got {value}"));
            }
        }
        if self.lra_low_percentile > self.lra_high_percentile {
            return Err("lra_low_percentile must not exceed lra_high_percentile".to_string());
        }
        if self.silence_threshold.is_nan() || self.silence_threshold < 0.0 {
            return Err(format!(
                "silence_threshold must not be negative, got {}",
                self.silence_threshold
            ));
        }
        Ok(())
    }

    /// Window and hop lengths in samples for `sample_rate`, each at least 1
    pub fn window_lengths(&self, sample_rate: f64) -> (usize, usize) {
        let window = (self.window_seconds * sample_rate).round().max(1.0) as usize;
        let hop = (self.hop_seconds * sample_rate).round().max(1.0) as usize;
        (window, hop)
    }
}
