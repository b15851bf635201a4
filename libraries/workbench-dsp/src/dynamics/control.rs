/// Domain-tagged sidechain buffer
///
/// The compressor's control signal changes units as it moves through the
/// chain: rectified level, then attenuation in dB, then a linear gain
/// multiplier. The tag records which one the samples currently hold, and each
/// stage checks it in debug builds.
use super::{GainComputer, LevelDetector};
use workbench_core::units::decibels_to_gain;
use workbench_core::AudioBuffer;

/// Unit of the samples held by a [`ControlSignal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDomain {
    /// Linear amplitude of the rectified sidechain
    Level,
    /// Attenuation in dB (zero or negative)
    Attenuation,
    /// Linear gain multiplier, makeup included
    Gain,
}

/// Reusable sidechain scratch buffer
///
/// Resizing never shrinks the allocation, so switching between the
/// real-time block size and an offline chunk size only allocates when a
/// larger size than ever before is requested.
#[derive(Debug, Clone)]
pub struct ControlSignal {
    samples: Vec<f32>,
    len: usize,
    domain: SignalDomain,
}

impl ControlSignal {
    /// Create a zeroed signal of `len` samples
    pub fn with_len(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
            len,
            domain: SignalDomain::Level,
        }
    }

    /// Change the active length, growing the allocation only if needed
    pub fn resize(&mut self, len: usize) {
        if len > self.samples.len() {
            self.samples.resize(len, 0.0);
        }
        self.len = len;
    }

    /// Active length
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the active length is zero
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated length
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Current domain
    pub fn domain(&self) -> SignalDomain {
        self.domain
    }

    /// Active samples
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.len]
    }

    /// Fill with the channel-max rectified sidechain of
    /// `buffer[..num_channels][offset..offset + len]`
    pub fn load_sidechain(&mut self, buffer: &AudioBuffer, offset: usize, num_channels: usize) {
        let len = self.len;
        let out = &mut self.samples[..len];
        out.fill(0.0);
        for channel in buffer.channels().take(num_channels) {
            for (level, sample) in out.iter_mut().zip(&channel[offset..offset + len]) {
                *level = level.max(sample.abs());
            }
        }
        self.domain = SignalDomain::Level;
    }

    /// Level -> attenuation through the static curve
    pub fn apply_gain_computer(&mut self, computer: &GainComputer) {
        debug_assert_eq!(self.domain, SignalDomain::Level);
        computer.apply_compression_to_buffer(&mut self.samples[..self.len]);
        self.domain = SignalDomain::Attenuation;
    }

    /// Smooth attenuation with peak ballistics
    pub fn apply_peak_detector(&mut self, detector: &mut LevelDetector) {
        debug_assert_eq!(self.domain, SignalDomain::Attenuation);
        detector.apply_peak_detector(&mut self.samples[..self.len]);
    }

    /// Smooth level with RMS ballistics
    pub fn apply_rms_detector(&mut self, detector: &mut LevelDetector) {
        debug_assert_eq!(self.domain, SignalDomain::Level);
        detector.apply_rms_detector(&mut self.samples[..self.len]);
    }

    /// Most negative attenuation in dB, or 0 for an empty signal
    pub fn deepest_attenuation(&self) -> f32 {
        debug_assert_eq!(self.domain, SignalDomain::Attenuation);
        self.as_slice().iter().copied().fold(0.0, f32::min)
    }

    /// Attenuation -> linear gain with `makeup_db` added
    pub fn convert_to_gain(&mut self, makeup_db: f32) {
        debug_assert_eq!(self.domain, SignalDomain::Attenuation);
        for sample in &mut self.samples[..self.len] {
            *sample = decibels_to_gain(*sample + makeup_db);
        }
        self.domain = SignalDomain::Gain;
    }
}

impl Default for ControlSignal {
    fn default() -> Self {
        Self::with_len(0)
    }
}
