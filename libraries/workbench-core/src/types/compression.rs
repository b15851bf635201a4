/// Compression parameter types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level-detection strategy of a compressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Gain computer first, then ballistics on the dB attenuation
    Peak,
    /// Ballistics on signal energy first, then gain computer
    Rms,
}

impl DetectionMode {
    /// Both modes, in report order
    pub const ALL: [Self; 2] = [Self::Peak, Self::Rms];

    /// Key prefix used by the parameter store (`peak_`, `rms_`)
    pub fn param_prefix(self) -> &'static str {
        match self {
            Self::Peak => "peak_",
            Self::Rms => "rms_",
        }
    }

    /// Lower-case name used in reports and file names
    pub fn label(self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::Rms => "rms",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peak => write!(f, "Peak"),
            Self::Rms => write!(f, "RMS"),
        }
    }
}

/// Parameter set for one detector mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParameters {
    /// Threshold in dB
    pub threshold_db: f32,

    /// Compression ratio (values above 23.9 act as a limiter)
    pub ratio: f32,

    /// Knee width in dB (0 = hard knee)
    pub knee_db: f32,

    /// Attack time in milliseconds
    pub attack_ms: f32,

    /// Release time in milliseconds
    pub release_ms: f32,

    /// Makeup gain in dB
    pub makeup_db: f32,
}

impl CompressorParameters {
    /// Parameter values of a freshly created workbench
    /// - Threshold: 0 dB
    /// - Ratio: 3:1
    /// - Knee: 0 dB (hard)
    /// - Attack: 50 ms
    /// - Release: 250 ms
    /// - Makeup: 0 dB
    pub fn new() -> Self {
        Self {
            threshold_db: 0.0,
            ratio: 3.0,
            knee_db: 0.0,
            attack_ms: 50.0,
            release_ms: 250.0,
            makeup_db: 0.0,
        }
    }
}

impl Default for CompressorParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompressorParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Threshold: {}, Ratio: {}, Knee: {}, Attack: {}, Release: {}, Makeup Gain: {}.",
            self.threshold_db,
            self.ratio,
            self.knee_db,
            self.attack_ms,
            self.release_ms,
            self.makeup_db
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_prefixes() {
        assert_eq!(DetectionMode::Peak.param_prefix(), "peak_");
        assert_eq!(DetectionMode::Rms.param_prefix(), "rms_");
        assert_eq!(DetectionMode::Rms.to_string(), "RMS");
    }

    #[test]
    fn parameters_display_as_report_line() {
        let params = CompressorParameters {
            threshold_db: -12.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 5.0,
            release_ms: 100.0,
            makeup_db: 1.5,
        };
        assert_eq!(
            params.to_string(),
            "Threshold: -12, Ratio: 4, Knee: 0, Attack: 5, Release: 100, Makeup Gain: 1.5."
        );
    }
}
