//! Statistics over a linear gain-reduction signal
//!
//! The compressor stores one linear gain per sample and channel. Each
//! sample is converted to dB; samples sitting on the silence floor are
//! left out of every dB statistic.

use crate::record::GainReductionStats;
use workbench_core::units::{gain_to_decibels, power_to_decibels, MINUS_INFINITY_DB};
use workbench_core::AudioBuffer;

/// Compute every gain-reduction statistic of `signal`
pub fn gain_reduction_stats(signal: &AudioBuffer, sample_rate: f64) -> GainReductionStats {
    let total = signal.num_channels() * signal.num_samples();
    if total == 0 {
        return GainReductionStats::default();
    }

    let mut sum_db = 0.0_f64;
    let mut deepest_db = 0.0_f64;
    let mut counted = 0_usize;
    let mut active = 0_usize;
    let mut sum_delta = 0.0_f64;
    let mut deltas = 0_usize;
    let mut sum_squares = 0.0_f64;
    let mut peak_gain = 0.0_f64;

    for channel in signal.channels() {
        let mut previous: Option<f64> = None;
        for &gain in channel {
            let linear = f64::from(gain);
            sum_squares += linear * linear;
            peak_gain = peak_gain.max(linear.abs());

            let db = gain_to_decibels(gain);
            if db <= MINUS_INFINITY_DB {
                continue;
            }
            if db < 0.0 {
                active += 1;
            }

            let db = f64::from(db);
            sum_db += db;
            deepest_db = deepest_db.min(db);
            counted += 1;
            if let Some(prev) = previous {
                sum_delta += (db - prev).abs();
                deltas += 1;
            }
            previous = Some(db);
        }
    }

    let average = if counted > 0 { sum_db / counted as f64 } else { 0.0 };
    let activity_ratio = if counted > 0 {
        active as f64 / counted as f64
    } else {
        0.0
    };

    let variance = if counted > 0 {
        signal
            .channels()
            .flat_map(|channel| channel.iter())
            .map(|&gain| gain_to_decibels(gain))
            .filter(|&db| db > MINUS_INFINITY_DB)
            .map(|db| {
                let diff = f64::from(db) - average;
                diff * diff
            })
            .sum::<f64>()
            / counted as f64
    } else {
        0.0
    };

    let mean_square = sum_squares / total as f64;
    let rms_gain = mean_square.sqrt();
    let crest_factor_db = if rms_gain > 0.0 {
        f64::from(gain_to_decibels((peak_gain / rms_gain) as f32))
    } else {
        0.0
    };

    let rate_of_change = if deltas > 0 {
        sum_delta / deltas as f64 * sample_rate
    } else {
        0.0
    };

    GainReductionStats {
        average_db: average.abs(),
        max_db: deepest_db.abs(),
        std_dev_db: variance.sqrt(),
        energy_db: power_to_decibels(mean_square),
        rate_of_change_db_per_sec: rate_of_change,
        activity_ratio,
        crest_factor_db,
    }
}
