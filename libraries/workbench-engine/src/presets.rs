//! Built-in compressor presets
//!
//! Each preset carries independent settings for the peak and RMS
//! compressors. The table is immutable.

use workbench_core::{CompressorParameters, DetectionMode};

/// A named pair of parameter sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: u8,
    pub name: &'static str,
    pub peak: CompressorParameters,
    pub rms: CompressorParameters,
}

impl Preset {
    /// Parameter set for `mode`
    pub fn parameters(&self, mode: DetectionMode) -> &CompressorParameters {
        match mode {
            DetectionMode::Peak => &self.peak,
            DetectionMode::Rms => &self.rms,
        }
    }
}

const fn params(
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    knee_db: f32,
    makeup_db: f32,
) -> CompressorParameters {
    CompressorParameters {
        threshold_db,
        ratio,
        knee_db,
        attack_ms,
        release_ms,
        makeup_db,
    }
}

const INSTRUMENT_PEAK: CompressorParameters = params(-20.0, 4.0, 20.0, 60.0, 2.0, 0.0);
const INSTRUMENT_RMS: CompressorParameters = params(-23.0, 3.0, 25.0, 170.0, 2.0, 0.0);

/// Every preset, ordered by id
pub const PRESETS: [Preset; 5] = [
    Preset {
        id: 1,
        name: "Drums",
        peak: params(-17.0, 4.0, 5.0, 100.0, 1.0, 2.6),
        rms: params(-19.5, 4.0, 10.0, 165.0, 1.0, 2.4),
    },
    Preset {
        id: 2,
        name: "Bass",
        peak: INSTRUMENT_PEAK,
        rms: INSTRUMENT_RMS,
    },
    Preset {
        id: 3,
        name: "Guitar",
        peak: INSTRUMENT_PEAK,
        rms: INSTRUMENT_RMS,
    },
    Preset {
        id: 4,
        name: "Vocals",
        peak: INSTRUMENT_PEAK,
        rms: INSTRUMENT_RMS,
    },
    Preset {
        id: 5,
        name: "FullMix",
        peak: INSTRUMENT_PEAK,
        rms: INSTRUMENT_RMS,
    },
];

/// Look up a preset by id
pub fn preset(id: u8) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Look up a preset by name, ignoring ASCII case
pub fn preset_by_name(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let ids: Vec<u8> = PRESETS.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn drums_preset_has_its_own_values() {
        let drums = preset(1).unwrap();
        assert_eq!(drums.name, "Drums");
        assert_eq!(drums.peak.threshold_db, -17.0);
        assert_eq!(drums.peak.attack_ms, 5.0);
        assert_eq!(drums.rms.release_ms, 165.0);
        assert_eq!(drums.parameters(DetectionMode::Rms).makeup_db, 2.4);
    }

    #[test]
    fn lookup_by_name_ignores_case() {
        assert_eq!(preset_by_name("fullmix").map(|p| p.id), Some(5));
        assert!(preset_by_name("Piano").is_none());
        assert!(preset(0).is_none());
        assert!(preset(6).is_none());
    }
}
