//! Two-stage shelving pre-filter for loudness measurement
//!
//! A low shelf followed by a high shelf, both with fixed corner frequencies
//! and Q, parameterised only by the sample rate. Coefficients follow the
//! RBJ cookbook shelf forms with the gain given as a linear factor.

use std::f64::consts::PI;
use workbench_core::AudioBuffer;

const LOW_SHELF_FREQUENCY: f64 = 1681.974450955533;
const LOW_SHELF_GAIN: f64 = 1.53512485958697;
const HIGH_SHELF_FREQUENCY: f64 = 424.318677406412;
const HIGH_SHELF_GAIN: f64 = 1.0;
const SHELF_Q: f64 = 0.7071752369554196;

/// Direct form I biquad section
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn low_shelf(sample_rate: f64, frequency: f64, q: f64, gain_factor: f64) -> Self {
        let a = gain_factor.max(0.0).sqrt();
        let (a_minus_1, a_plus_1) = (a - 1.0, a + 1.0);
        let omega = 2.0 * PI * frequency.max(2.0) / sample_rate;
        let cos_omega = omega.cos();
        let beta = omega.sin() * a.sqrt() / q;
        let a_minus_1_cos = a_minus_1 * cos_omega;

        Self::from_raw(
            a * (a_plus_1 - a_minus_1_cos + beta),
            a * 2.0 * (a_minus_1 - a_plus_1 * cos_omega),
            a * (a_plus_1 - a_minus_1_cos - beta),
            a_plus_1 + a_minus_1_cos + beta,
            -2.0 * (a_minus_1 + a_plus_1 * cos_omega),
            a_plus_1 + a_minus_1_cos - beta,
        )
    }

    fn high_shelf(sample_rate: f64, frequency: f64, q: f64, gain_factor: f64) -> Self {
        let a = gain_factor.max(0.0).sqrt();
        let (a_minus_1, a_plus_1) = (a - 1.0, a + 1.0);
        let omega = 2.0 * PI * frequency.max(2.0) / sample_rate;
        let cos_omega = omega.cos();
        let beta = omega.sin() * a.sqrt() / q;
        let a_minus_1_cos = a_minus_1 * cos_omega;

        Self::from_raw(
            a * (a_plus_1 + a_minus_1_cos + beta),
            a * -2.0 * (a_minus_1 + a_plus_1 * cos_omega),
            a * (a_plus_1 + a_minus_1_cos - beta),
            a_plus_1 - a_minus_1_cos + beta,
            2.0 * (a_minus_1 - a_plus_1 * cos_omega),
            a_plus_1 - a_minus_1_cos - beta,
        )
    }

    #[inline]
    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Low shelf then high shelf, applied to one channel at a time
#[derive(Debug, Clone)]
pub struct KWeightingFilter {
    low_shelf: Biquad,
    high_shelf: Biquad,
}

impl KWeightingFilter {
    /// Build the filter pair for `sample_rate`
    pub fn new(sample_rate: f64) -> Self {
        Self {
            low_shelf: Biquad::low_shelf(sample_rate, LOW_SHELF_FREQUENCY, SHELF_Q, LOW_SHELF_GAIN),
            high_shelf: Biquad::high_shelf(
                sample_rate,
                HIGH_SHELF_FREQUENCY,
                SHELF_Q,
                HIGH_SHELF_GAIN,
            ),
        }
    }

    /// Filter samples in place
    pub fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let low = self.low_shelf.process(f64::from(*sample));
            *sample = self.high_shelf.process(low) as f32;
        }
    }

    /// Clear filter memory
    pub fn reset(&mut self) {
        self.low_shelf.reset();
        self.high_shelf.reset();
    }
}

/// K-weighted copy of `buffer`; each channel starts from clean filter state
pub fn apply_k_weighting(buffer: &AudioBuffer, sample_rate: f64) -> AudioBuffer {
    let mut weighted = buffer.clone();
    let mut filter = KWeightingFilter::new(sample_rate);
    for channel in weighted.channels_mut() {
        filter.reset();
        filter.process(channel);
    }
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 48_000.0;

    fn steady_state_gain(frequency: f64) -> f64 {
        let len = 48_000;
        let samples: Vec<f32> = (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / FS).sin() as f32)
            .collect();
        let buffer = AudioBuffer::from_channels(vec![samples]).unwrap();
        let weighted = apply_k_weighting(&buffer, FS);
        let tail = &weighted.channel(0)[len / 2..];
        tail.iter().fold(0.0_f32, |m, s| m.max(s.abs())) as f64
    }

    #[test]
    fn unity_high_shelf_is_transparent() {
        let mut shelf = Biquad::high_shelf(FS, HIGH_SHELF_FREQUENCY, SHELF_Q, 1.0);
        for x in [1.0, -0.5, 0.25, 0.0, 0.75] {
            assert!((shelf.process(x) - x).abs() < 1e-12);
        }
    }

    #[test]
    fn low_shelf_boosts_low_frequencies() {
        // Passband gain below the corner approaches the linear gain factor
        let low = steady_state_gain(50.0);
        assert!((low - LOW_SHELF_GAIN).abs() < 0.02, "low band gain {low}");

        // Well above the corner the shelf is flat
        let high = steady_state_gain(15_000.0);
        assert!((high - 1.0).abs() < 0.02, "high band gain {high}");
    }

    #[test]
    fn copy_leaves_input_untouched() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5; 64], vec![-0.5; 64]]).unwrap();
        let weighted = apply_k_weighting(&buffer, FS);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.5));
        assert_ne!(weighted.channel(0), buffer.channel(0));
    }

    #[test]
    fn channels_are_filtered_independently() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.3; 256], vec![0.3; 256]]).unwrap();
        let weighted = apply_k_weighting(&buffer, FS);
        assert_eq!(weighted.channel(0), weighted.channel(1));
    }
}
