//! Live parameter store
//!
//! A fixed set of float parameters shared between the audio callback, the
//! offline engine, and whatever host drives them. Values live in atomics
//! so any thread can read or write without locking.

use crate::error::{EngineError, Result};
use crate::presets::preset;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;
use workbench_core::{CompressorParameters, DetectionMode, ParameterSource};

/// Master on/off (1 = processing, 0 = bypassed)
pub const POWER: &str = "power";
/// Silence the output (1 = muted)
pub const MUTE: &str = "mute";
/// Compressor driving the live path (0 = peak, 1 = RMS)
pub const IS_RMS: &str = "isRMS";

/// Range and default of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    pub key: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParameterInfo {
    const fn new(key: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            key,
            min,
            max,
            default,
        }
    }

    fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Every parameter the store knows about
pub const PARAMETERS: [ParameterInfo; 15] = [
    ParameterInfo::new(POWER, 0.0, 1.0, 1.0),
    ParameterInfo::new(MUTE, 0.0, 1.0, 0.0),
    ParameterInfo::new(IS_RMS, 0.0, 1.0, 0.0),
    ParameterInfo::new("peak_threshold", -60.0, 0.0, 0.0),
    ParameterInfo::new("peak_ratio", 1.0, 24.0, 3.0),
    ParameterInfo::new("peak_knee", 0.0, 24.0, 0.0),
    ParameterInfo::new("peak_attack", 5.0, 500.0, 50.0),
    ParameterInfo::new("peak_release", 5.0, 500.0, 250.0),
    ParameterInfo::new("peak_makeup", -40.0, 40.0, 0.0),
    ParameterInfo::new("rms_threshold", -60.0, 0.0, 0.0),
    ParameterInfo::new("rms_ratio", 1.0, 24.0, 3.0),
    ParameterInfo::new("rms_knee", 0.0, 24.0, 0.0),
    ParameterInfo::new("rms_attack", 5.0, 500.0, 50.0),
    ParameterInfo::new("rms_release", 5.0, 500.0, 250.0),
    ParameterInfo::new("rms_makeup", -40.0, 40.0, 0.0),
];

/// Index of the first per-mode parameter for `mode`
fn mode_base(mode: DetectionMode) -> usize {
    match mode {
        DetectionMode::Peak => 3,
        DetectionMode::Rms => 9,
    }
}

/// Thread-safe key/value parameter store
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicU32; PARAMETERS.len()],
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// Create a store holding every default value
    pub fn new() -> Self {
        Self {
            values: PARAMETERS.map(|info| AtomicU32::new(info.default.to_bits())),
        }
    }

    fn index_of(key: &str) -> Option<usize> {
        PARAMETERS.iter().position(|info| info.key == key)
    }

    #[inline]
    fn load(&self, index: usize) -> f32 {
        f32::from_bits(self.values[index].load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, index: usize, value: f32) -> f32 {
        let clamped = PARAMETERS[index].clamp(value);
        self.values[index].store(clamped.to_bits(), Ordering::Relaxed);
        clamped
    }

    /// Current value of `key`
    pub fn get(&self, key: &str) -> Option<f32> {
        Self::index_of(key).map(|index| self.load(index))
    }

    /// Set `key`, clamped to its range; returns the stored value
    pub fn set(&self, key: &str, value: f32) -> Result<f32> {
        let index =
            Self::index_of(key).ok_or_else(|| EngineError::UnknownParameter(key.to_string()))?;
        Ok(self.store(index, value))
    }

    /// Range and default of `key`
    pub fn info(key: &str) -> Option<&'static ParameterInfo> {
        PARAMETERS.iter().find(|info| info.key == key)
    }

    /// Restore every default
    pub fn reset(&self) {
        for (index, info) in PARAMETERS.iter().enumerate() {
            self.store(index, info.default);
        }
    }

    /// Master power switch
    pub fn is_powered(&self) -> bool {
        self.load(0) >= 0.5
    }

    /// Output mute switch
    pub fn is_muted(&self) -> bool {
        self.load(1) >= 0.5
    }

    /// Compressor selected for the live path
    pub fn detection_mode(&self) -> DetectionMode {
        if self.load(2) >= 0.5 {
            DetectionMode::Rms
        } else {
            DetectionMode::Peak
        }
    }

    /// Parameter set for `mode`
    pub fn compressor_parameters(&self, mode: DetectionMode) -> CompressorParameters {
        let base = mode_base(mode);
        CompressorParameters {
            threshold_db: self.load(base),
            ratio: self.load(base + 1),
            knee_db: self.load(base + 2),
            attack_ms: self.load(base + 3),
            release_ms: self.load(base + 4),
            makeup_db: self.load(base + 5),
        }
    }

    /// Write a full parameter set for `mode`, clamping each value
    pub fn set_compressor_parameters(&self, mode: DetectionMode, params: &CompressorParameters) {
        let base = mode_base(mode);
        self.store(base, params.threshold_db);
        self.store(base + 1, params.ratio);
        self.store(base + 2, params.knee_db);
        self.store(base + 3, params.attack_ms);
        self.store(base + 4, params.release_ms);
        self.store(base + 5, params.makeup_db);
    }

    /// Load both parameter sets of preset `id`
    pub fn apply_preset(&self, id: u8) -> Result<()> {
        let preset = preset(id).ok_or(EngineError::UnknownPreset(id))?;
        for mode in DetectionMode::ALL {
            self.set_compressor_parameters(mode, preset.parameters(mode));
        }
        debug!(id, name = preset.name, "Applied preset");
        Ok(())
    }
}

impl ParameterSource for ParameterStore {
    fn value(&self, key: &str) -> Option<f32> {
        self.get(key)
    }
}
