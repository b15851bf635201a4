/// Peak envelope follower for level meters
use workbench_core::AudioBuffer;

/// Below this the held peak snaps to zero
const PEAK_FLOOR: f32 = 0.001;

/// Instant-attack peak hold with multiplicative decay
///
/// Each sample's level is the mean absolute value across channels.
#[derive(Debug, Clone)]
pub struct LevelEnvelopeFollower {
    sample_rate: f64,
    decay_secs: f32,
    decay: f32,
    peak: f32,
}

impl LevelEnvelopeFollower {
    /// Create a follower with a 0.5 s decay
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            decay_secs: 0.5,
            decay: 0.99992,
            peak: 0.0,
        }
    }

    /// Recompute the per-sample decay factor for `sample_rate`
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let decay_samples = (f64::from(self.decay_secs) * sample_rate).round() as i64;
        self.decay = if decay_samples > 0 {
            1.0 - 1.0 / decay_samples as f32
        } else {
            0.0
        };
    }

    /// Set the decay time in seconds
    pub fn set_peak_decay(&mut self, seconds: f32) {
        self.decay_secs = seconds;
        self.prepare(self.sample_rate);
    }

    /// Feed one block
    pub fn update_peak(&mut self, buffer: &AudioBuffer) {
        let channels = buffer.num_channels();
        if channels == 0 {
            return;
        }
        let scale = 1.0 / channels as f32;
        for i in 0..buffer.num_samples() {
            let level = buffer.channels().map(|c| c[i].abs()).sum::<f32>() * scale;
            if level > self.peak {
                self.peak = level;
            } else if self.peak > PEAK_FLOOR {
                self.peak *= self.decay;
            } else {
                self.peak = 0.0;
            }
        }
    }

    /// Current held peak (linear)
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Drop the held peak
    pub fn reset(&mut self) {
        self.peak = 0.0;
    }
}

impl Default for LevelEnvelopeFollower {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_peak_instantly() {
        let mut follower = LevelEnvelopeFollower::new();
        follower.prepare(48_000.0);
        let buffer = AudioBuffer::from_channels(vec![vec![0.0, 0.8], vec![0.0, -0.4]]).unwrap();
        follower.update_peak(&buffer);
        assert!((follower.peak() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn decays_then_snaps_to_zero() {
        let mut follower = LevelEnvelopeFollower::new();
        follower.prepare(1000.0);
        follower.set_peak_decay(0.01);

        let mut hit = AudioBuffer::new(1, 1);
        hit.channel_mut(0)[0] = 1.0;
        follower.update_peak(&hit);

        let silence = AudioBuffer::new(1, 5);
        follower.update_peak(&silence);
        // 10 sample decay: factor 0.9 per sample
        assert!((follower.peak() - 0.9_f32.powi(5)).abs() < 1e-5);

        let long_silence = AudioBuffer::new(1, 200);
        follower.update_peak(&long_silence);
        assert_eq!(follower.peak(), 0.0);
    }
}
