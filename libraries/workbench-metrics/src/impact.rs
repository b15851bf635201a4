//! Comparison of a compressed signal against its uncompressed source
//!
//! Both buffers must share a shape; the calculator checks that before
//! calling in here.

use crate::config::MetricsConfig;
use crate::record::{ImpactMetrics, SignalMetrics};
use crate::signal::{mean_square, percentile_of_sorted, sort_ascending, window_ranges};
use workbench_core::AudioBuffer;

/// Percentile of absolute sample-to-sample differences across all channels
///
/// Differences never cross a channel boundary. Fewer than two samples: 0.
pub fn transient_strength(buffer: &AudioBuffer, percentile: f64) -> f64 {
    let mut deltas: Vec<f64> = buffer
        .channels()
        .flat_map(|channel| {
            channel
                .windows(2)
                .map(|pair| (f64::from(pair[1]) - f64::from(pair[0])).abs())
        })
        .collect();
    sort_ascending(&mut deltas);
    percentile_of_sorted(&deltas, percentile).unwrap_or(0.0)
}

/// `1 - compressed/uncompressed` transient strength, clamped to [-1, 1]
///
/// Positive when transients got flatter. Uncompressed strength of 0: 0.
pub fn transient_impact(uncompressed: &AudioBuffer, compressed: &AudioBuffer, percentile: f64) -> f64 {
    let reference = transient_strength(uncompressed, percentile);
    if reference <= 0.0 {
        return 0.0;
    }
    let strength = transient_strength(compressed, percentile);
    (1.0 - strength / reference).clamp(-1.0, 1.0)
}

/// Energy kept in the loudest windows of the uncompressed signal
///
/// Windows whose uncompressed RMS reaches the percentile threshold are
/// selected; the ratio of summed squared RMS over those windows is
/// capped at 1. No windows or no energy: 0.
pub fn transient_energy_preservation(
    uncompressed: &AudioBuffer,
    compressed: &AudioBuffer,
    sample_rate: f64,
    config: &MetricsConfig,
) -> f64 {
    let (window, hop) = config.window_lengths(sample_rate);
    let windows: Vec<(f64, f64)> = window_ranges(uncompressed.num_samples(), window, hop)
        .map(|range| {
            (
                mean_square(uncompressed, range.clone()).sqrt(),
                mean_square(compressed, range).sqrt(),
            )
        })
        .collect();

    let mut sorted: Vec<f64> = windows.iter().map(|&(u, _)| u).collect();
    sort_ascending(&mut sorted);
    let Some(threshold) = percentile_of_sorted(&sorted, config.transient_percentile) else {
        return 0.0;
    };

    let (uncompressed_energy, compressed_energy) = windows
        .iter()
        .filter(|&&(u, _)| u >= threshold)
        .fold((0.0, 0.0), |(ue, ce), &(u, c)| (ue + u * u, ce + c * c));

    if uncompressed_energy > 0.0 {
        (compressed_energy / uncompressed_energy).min(1.0)
    } else {
        0.0
    }
}

fn paired_samples<'a>(
    uncompressed: &'a AudioBuffer,
    compressed: &'a AudioBuffer,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    uncompressed
        .channels()
        .zip(compressed.channels())
        .flat_map(|(u, c)| u.iter().zip(c.iter()))
        .map(|(&u, &c)| (f64::from(u), f64::from(c)))
}

fn sample_count(buffer: &AudioBuffer) -> usize {
    buffer.num_channels() * buffer.num_samples()
}

/// Root mean square error between the two signals
pub fn rmse(uncompressed: &AudioBuffer, compressed: &AudioBuffer) -> f64 {
    let count = sample_count(uncompressed);
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = paired_samples(uncompressed, compressed)
        .map(|(u, c)| (u - c) * (u - c))
        .sum();
    (sum / count as f64).sqrt()
}

/// RMS of the difference signal relative to the uncompressed RMS
///
/// Silent uncompressed input: 0.
pub fn harmonic_distortion(uncompressed: &AudioBuffer, compressed: &AudioBuffer) -> f64 {
    let reference = mean_square(uncompressed, 0..uncompressed.num_samples()).sqrt();
    if reference > 0.0 {
        rmse(uncompressed, compressed) / reference
    } else {
        0.0
    }
}

/// Pearson correlation over all samples; 0 when either signal is constant
pub fn correlation(uncompressed: &AudioBuffer, compressed: &AudioBuffer) -> f64 {
    let count = sample_count(uncompressed);
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let (sum_u, sum_c) = paired_samples(uncompressed, compressed)
        .fold((0.0, 0.0), |(su, sc), (u, c)| (su + u, sc + c));
    let (mean_u, mean_c) = (sum_u / n, sum_c / n);

    let (covariance, var_u, var_c) = paired_samples(uncompressed, compressed).fold(
        (0.0, 0.0, 0.0),
        |(cov, vu, vc), (u, c)| {
            let (du, dc) = (u - mean_u, c - mean_c);
            (cov + du * dc, vu + du * du, vc + dc * dc)
        },
    );

    let denominator = (var_u * var_c).sqrt();
    if denominator > 0.0 {
        (covariance / denominator).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Every comparison figure for one compressed signal
pub fn impact_metrics(
    uncompressed: &AudioBuffer,
    uncompressed_metrics: &SignalMetrics,
    compressed: &AudioBuffer,
    compressed_metrics: &SignalMetrics,
    sample_rate: f64,
    config: &MetricsConfig,
) -> ImpactMetrics {
    ImpactMetrics {
        crest_reduction_db: uncompressed_metrics.crest_factor_db - compressed_metrics.crest_factor_db,
        lra_reduction: uncompressed_metrics.lra - compressed_metrics.lra,
        transient_impact: transient_impact(uncompressed, compressed, config.transient_percentile),
        transient_energy_preservation: transient_energy_preservation(
            uncompressed,
            compressed,
            sample_rate,
            config,
        ),
        harmonic_distortion: harmonic_distortion(uncompressed, compressed),
        rmse: rmse(uncompressed, compressed),
        correlation: correlation(uncompressed, compressed),
    }
}
