/// Static soft-knee compression curve
use workbench_core::units::gain_to_decibels;

/// Ratios above this behave as an infinite ratio (limiter)
const LIMITER_RATIO: f32 = 23.9;

/// Sidechain floor before dB conversion
const LEVEL_FLOOR: f32 = 1e-6;

/// Memoryless threshold/ratio/knee transfer function
///
/// Maps an instantaneous level in dB to an attenuation in dB (zero or
/// negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    threshold: f32,
    ratio: f32,
    knee: f32,
    knee_half: f32,
    slope: f32,
}

impl GainComputer {
    /// Create a gain computer
    /// - Threshold: -20 dB
    /// - Ratio: 2:1
    /// - Knee: 6 dB
    pub fn new() -> Self {
        Self {
            threshold: -20.0,
            ratio: 2.0,
            knee: 6.0,
            knee_half: 3.0,
            slope: -0.5,
        }
    }

    /// Set the threshold in dB
    pub fn set_threshold(&mut self, threshold_db: f32) {
        self.threshold = threshold_db;
    }

    /// Set the ratio; values above 23.9 turn the curve into a limiter
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
        self.slope = if ratio > LIMITER_RATIO {
            -1.0
        } else {
            1.0 / ratio - 1.0
        };
    }

    /// Set the knee width in dB (0 = hard knee)
    pub fn set_knee(&mut self, knee_db: f32) {
        self.knee = knee_db;
        self.knee_half = knee_db / 2.0;
    }

    /// Threshold in dB
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Ratio
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Knee width in dB
    pub fn knee(&self) -> f32 {
        self.knee
    }

    /// Slope of the curve above the knee (`1/ratio - 1`, or -1 when limiting)
    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// Attenuation in dB for a level in dB
    ///
    /// With a zero knee the quadratic branch is unreachable, so there is no
    /// division by the knee width.
    #[inline]
    pub fn apply_compression(&self, level_db: f32) -> f32 {
        let overshoot = level_db - self.threshold;

        if overshoot <= -self.knee_half {
            0.0
        } else if overshoot <= self.knee_half {
            let x = overshoot + self.knee_half;
            0.5 * self.slope * x * x / self.knee
        } else {
            self.slope * overshoot
        }
    }

    /// Convert a linear sidechain into attenuation in dB, in place
    ///
    /// Each sample is floored at 1e-6 before conversion to avoid `-inf`.
    pub fn apply_compression_to_buffer(&self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let level = sample.abs().max(LEVEL_FLOOR);
            *sample = self.apply_compression(gain_to_decibels(level));
        }
    }
}

impl Default for GainComputer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computer(threshold: f32, ratio: f32, knee: f32) -> GainComputer {
        let mut gc = GainComputer::new();
        gc.set_threshold(threshold);
        gc.set_ratio(ratio);
        gc.set_knee(knee);
        gc
    }

    #[test]
    fn defaults() {
        let gc = GainComputer::new();
        assert_eq!(gc.threshold(), -20.0);
        assert_eq!(gc.ratio(), 2.0);
        assert_eq!(gc.knee(), 6.0);
        assert_eq!(gc.slope(), -0.5);
    }

    #[test]
    fn below_knee_is_untouched() {
        let gc = GainComputer::new();
        assert_eq!(gc.apply_compression(-40.0), 0.0);
        assert_eq!(gc.apply_compression(-23.0), 0.0);
    }

    #[test]
    fn above_knee_is_linear() {
        let gc = GainComputer::new();
        // overshoot 20 dB at 2:1
        assert_eq!(gc.apply_compression(0.0), -10.0);
    }

    #[test]
    fn knee_midpoint_is_quadratic() {
        let gc = GainComputer::new();
        // 0.5 * -0.5 * 3^2 / 6
        assert!((gc.apply_compression(-20.0) - -0.375).abs() < 1e-6);
    }

    #[test]
    fn hard_knee_has_no_division_by_zero() {
        let gc = computer(-12.0, 4.0, 0.0);
        assert_eq!(gc.apply_compression(-12.0), 0.0);
        assert_eq!(gc.apply_compression(0.0), -9.0);
        assert!(gc.apply_compression(-11.999).is_finite());
    }

    #[test]
    fn large_ratio_limits() {
        let gc = computer(-10.0, 24.0, 0.0);
        assert_eq!(gc.slope(), -1.0);
        assert_eq!(gc.apply_compression(0.0), -10.0);

        let gc = computer(-10.0, 23.9, 0.0);
        assert!(gc.slope() > -1.0);
    }

    #[test]
    fn buffer_conversion_floors_silence() {
        let gc = computer(-90.0, 2.0, 0.0);
        let mut samples = [0.0_f32, 1.0];
        gc.apply_compression_to_buffer(&mut samples);
        // silence lands on the -100 dB floor, below threshold
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], -45.0);
    }

    #[test]
    fn buffer_conversion_uses_magnitude() {
        let gc = computer(-12.0, 4.0, 0.0);
        let mut samples = [-1.0_f32, 1.0];
        gc.apply_compression_to_buffer(&mut samples);
        assert_eq!(samples[0], samples[1]);
    }
}
