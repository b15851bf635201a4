//! EBU R128 reference loudness
//!
//! Cross-checks the built-in K-weighted loudness figures with a full
//! BS.1770 meter (gating, 3 s short-term windows for LRA).

use crate::error::{MetricsError, Result};
use ebur128::{EbuR128, Mode};
use serde::Serialize;
use workbench_core::AudioBuffer;

/// Reference measurements; `None` when the meter has nothing to report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReferenceLoudness {
    /// Gated integrated loudness in LUFS
    pub integrated_lufs: Option<f64>,
    /// Loudness range in LU
    pub loudness_range_lu: Option<f64>,
}

/// Measure `buffer` with an EBU R128 meter
///
/// Silent or too-short input yields `None` fields rather than an error.
///
/// # Errors
/// Returns an error if the meter rejects the channel count or sample rate.
pub fn measure_reference(buffer: &AudioBuffer, sample_rate: f64) -> Result<ReferenceLoudness> {
    if !(sample_rate.is_finite() && sample_rate >= 1.0) {
        return Err(MetricsError::InvalidSampleRate(sample_rate));
    }

    let mut meter = EbuR128::new(
        buffer.num_channels() as u32,
        sample_rate.round() as u32,
        Mode::I | Mode::LRA,
    )?;
    meter.add_frames_f32(&buffer.to_interleaved())?;

    let integrated_lufs = meter.loudness_global()?;
    let loudness_range_lu = meter.loudness_range()?;

    Ok(ReferenceLoudness {
        integrated_lufs: integrated_lufs.is_finite().then_some(integrated_lufs),
        loudness_range_lu: (integrated_lufs.is_finite() && loudness_range_lu.is_finite())
            .then_some(loudness_range_lu),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(amplitude: f64, seconds: f64, sample_rate: f64) -> AudioBuffer {
        let len = (seconds * sample_rate) as usize;
        let samples: Vec<f32> = (0..len)
            .map(|i| (amplitude * (2.0 * PI * 1000.0 * i as f64 / sample_rate).sin()) as f32)
            .collect();
        AudioBuffer::from_channels(vec![samples.clone(), samples]).unwrap()
    }

    #[test]
    fn silence_has_no_reference_loudness() {
        let buffer = AudioBuffer::new(2, 48_000);
        let reference = measure_reference(&buffer, 48_000.0).unwrap();
        assert_eq!(reference.integrated_lufs, None);
        assert_eq!(reference.loudness_range_lu, None);
    }

    #[test]
    fn louder_tone_measures_louder() {
        let quiet = measure_reference(&sine(0.1, 2.0, 48_000.0), 48_000.0).unwrap();
        let loud = measure_reference(&sine(0.5, 2.0, 48_000.0), 48_000.0).unwrap();

        let quiet = quiet.integrated_lufs.unwrap();
        let loud = loud.integrated_lufs.unwrap();
        // 20*log10(5) ~= 13.98 dB apart
        assert!((loud - quiet - 13.98).abs() < 0.1, "quiet {quiet}, loud {loud}");
    }

    #[test]
    fn invalid_sample_rate_is_rejected() {
        let buffer = AudioBuffer::new(1, 16);
        assert!(matches!(
            measure_reference(&buffer, 0.0),
            Err(MetricsError::InvalidSampleRate(_))
        ));
    }
}
