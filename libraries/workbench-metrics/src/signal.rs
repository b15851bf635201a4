//! Per-signal descriptors: peak, energy, crest factor, loudness, loudness range

use crate::config::MetricsConfig;
use crate::k_weighting::apply_k_weighting;
use crate::record::SignalMetrics;
use std::ops::Range;
use workbench_core::units::{gain_to_decibels, power_to_decibels};
use workbench_core::AudioBuffer;

/// Calibration offset between K-weighted mean energy and LUFS
pub const LUFS_OFFSET_DB: f64 = 0.691;

/// Start/end sample ranges of every full window that fits in `num_samples`
pub fn window_ranges(
    num_samples: usize,
    window: usize,
    hop: usize,
) -> impl Iterator<Item = Range<usize>> {
    let hop = hop.max(1);
    let count = if window == 0 || num_samples < window {
        0
    } else {
        (num_samples - window) / hop + 1
    };
    (0..count).map(move |i| i * hop..i * hop + window)
}

/// Index-based percentile of an ascending slice, no interpolation
///
/// Returns `None` for an empty slice.
pub fn percentile_of_sorted(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((percentile / 100.0) * sorted.len() as f64).floor().max(0.0) as usize;
    Some(sorted[index.min(sorted.len() - 1)])
}

/// Sort `values` ascending, NaN-safe
pub(crate) fn sort_ascending(values: &mut [f64]) {
    values.sort_by(f64::total_cmp);
}

/// Mean of squared samples inside `range`, skipping samples below `silence_threshold`
///
/// The skipped samples leave both the sum and the count. All gated: 0.
pub fn gated_mean_square(buffer: &AudioBuffer, range: Range<usize>, silence_threshold: f64) -> f64 {
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for channel in buffer.channels() {
        for &sample in &channel[range.clone()] {
            let sample = f64::from(sample);
            if sample.abs() >= silence_threshold {
                sum += sample * sample;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Plain mean of squared samples inside `range` across all channels
pub fn mean_square(buffer: &AudioBuffer, range: Range<usize>) -> f64 {
    let count = buffer.num_channels() * range.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = buffer
        .channels()
        .flat_map(|channel| channel[range.clone()].iter())
        .map(|&s| f64::from(s) * f64::from(s))
        .sum();
    sum / count as f64
}

/// Silence-gated mean energy of the whole buffer
pub fn mean_square_energy(buffer: &AudioBuffer, silence_threshold: f64) -> f64 {
    gated_mean_square(buffer, 0..buffer.num_samples(), silence_threshold)
}

/// Peak to RMS ratio in dB; 0 when `rms` is not positive
pub fn crest_factor_db(peak: f64, rms: f64) -> f64 {
    if rms > 0.0 {
        f64::from(gain_to_decibels((peak / rms) as f32))
    } else {
        0.0
    }
}

/// Loudness of an already K-weighted range
fn loudness_of(weighted: &AudioBuffer, range: Range<usize>, silence_threshold: f64) -> f64 {
    power_to_decibels(gated_mean_square(weighted, range, silence_threshold)) - LUFS_OFFSET_DB
}

/// Integrated loudness of an already K-weighted buffer
pub fn integrated_loudness(weighted: &AudioBuffer, silence_threshold: f64) -> f64 {
    loudness_of(weighted, 0..weighted.num_samples(), silence_threshold)
}

/// Loudness range of an already K-weighted buffer
///
/// Windows whose gated energy is zero are left out. No usable windows: 0.
pub fn loudness_range(weighted: &AudioBuffer, sample_rate: f64, config: &MetricsConfig) -> f64 {
    let (window, hop) = config.window_lengths(sample_rate);
    let mut loudness: Vec<f64> = window_ranges(weighted.num_samples(), window, hop)
        .filter_map(|range| {
            let energy = gated_mean_square(weighted, range, config.silence_threshold);
            (energy > 0.0).then(|| power_to_decibels(energy) - LUFS_OFFSET_DB)
        })
        .collect();
    sort_ascending(&mut loudness);

    match (
        percentile_of_sorted(&loudness, config.lra_low_percentile),
        percentile_of_sorted(&loudness, config.lra_high_percentile),
    ) {
        (Some(low), Some(high)) => high - low,
        _ => 0.0,
    }
}

/// Every per-signal descriptor of `buffer`
pub fn signal_metrics(buffer: &AudioBuffer, sample_rate: f64, config: &MetricsConfig) -> SignalMetrics {
    let peak = f64::from(buffer.magnitude());
    let mean_energy = mean_square_energy(buffer, config.silence_threshold);
    let rms = mean_energy.sqrt();

    let weighted = apply_k_weighting(buffer, sample_rate);

    SignalMetrics {
        peak,
        mean_energy,
        rms,
        crest_factor_db: crest_factor_db(peak, rms),
        lufs: integrated_loudness(&weighted, config.silence_threshold),
        lra: loudness_range(&weighted, sample_rate, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn stereo(samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::from_channels(vec![samples.clone(), samples]).unwrap()
    }

    #[test]
    fn windows_only_cover_full_lengths() {
        let ranges: Vec<_> = window_ranges(10, 4, 2).collect();
        assert_eq!(ranges, vec![0..4, 2..6, 4..8, 6..10]);
        assert_eq!(window_ranges(3, 4, 2).count(), 0);
        assert_eq!(window_ranges(4, 4, 2).count(), 1);
    }

    #[test]
    fn percentile_is_index_based() {
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        assert_eq!(percentile_of_sorted(&values, 10.0), Some(2.0));
        assert_eq!(percentile_of_sorted(&values, 95.0), Some(19.0));
        assert_eq!(percentile_of_sorted(&values, 100.0), Some(19.0));
        assert_eq!(percentile_of_sorted(&[], 50.0), None);
    }

    #[test]
    fn gating_removes_samples_from_the_count() {
        // Half the samples are below the gate; the mean is over the other half only
        let buffer = stereo(vec![0.5, 0.0, 0.5, 0.00001]);
        assert!((mean_square_energy(&buffer, 0.0001) - 0.25).abs() < 1e-12);
        assert!((mean_square(&buffer, 0..4) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn silence_yields_zeros_and_floor_loudness() {
        let buffer = AudioBuffer::new(2, 44_100);
        let metrics = signal_metrics(&buffer, 44_100.0, &MetricsConfig::default());

        assert_eq!(metrics.peak, 0.0);
        assert_eq!(metrics.mean_energy, 0.0);
        assert_eq!(metrics.rms, 0.0);
        assert_eq!(metrics.crest_factor_db, 0.0);
        assert!((metrics.lufs - (-100.0 - LUFS_OFFSET_DB)).abs() < 1e-9);
        assert_eq!(metrics.lra, 0.0);
    }

    #[test]
    fn sine_crest_factor_is_three_db() {
        let fs = 44_100.0;
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (0.5 * (2.0 * PI * 1000.0 * f64::from(i) / fs).sin()) as f32)
            .collect();
        let metrics = signal_metrics(&stereo(samples), fs, &MetricsConfig::default());

        assert!((metrics.peak - 0.5).abs() < 1e-3);
        assert!((metrics.rms - 0.5 / 2.0_f64.sqrt()).abs() < 1e-3);
        assert!((metrics.crest_factor_db - 3.0103).abs() < 0.02);
        // A steady tone has no loudness range
        assert!(metrics.lra.abs() < 0.05, "lra {}", metrics.lra);
    }

    #[test]
    fn level_steps_widen_loudness_range() {
        let fs = 8_000.0;
        let samples: Vec<f32> = (0..80_000)
            .map(|i| {
                let amplitude = if i < 40_000 { 0.05 } else { 0.5 };
                (amplitude * (2.0 * PI * 1000.0 * f64::from(i) / fs).sin()) as f32
            })
            .collect();
        let metrics = signal_metrics(&stereo(samples), fs, &MetricsConfig::default());
        // 20 dB step between the two halves
        assert!((metrics.lra - 20.0).abs() < 0.5, "lra {}", metrics.lra);
    }
}
