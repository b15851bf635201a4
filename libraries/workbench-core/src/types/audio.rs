/// Audio-related types
use crate::error::{Result, WorkbenchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Processing configuration applied at prepare time
///
/// Applying a spec to a component resets its internal state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,

    /// Maximum number of samples per processed block
    pub block_size: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub num_channels: u32,
}

impl ProcessSpec {
    /// Create a new process spec
    pub fn new(sample_rate: f64, block_size: u32, num_channels: u32) -> Self {
        Self {
            sample_rate,
            block_size,
            num_channels,
        }
    }

    /// Same spec with a different block size
    #[must_use]
    pub fn with_block_size(self, block_size: u32) -> Self {
        Self { block_size, ..self }
    }
}

/// Planar audio buffer
///
/// Samples are stored as f32, indexed `[channel][sample]`. Every channel
/// holds exactly `num_samples` samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
            num_samples,
        }
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// Returns an error if the channels differ in length
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self> {
        let num_samples = channels.first().map_or(0, Vec::len);
        if let Some(bad) = channels.iter().position(|c| c.len() != num_samples) {
            return Err(WorkbenchError::invalid_parameter(format!(
                "channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                num_samples
            )));
        }
        Ok(Self {
            channels,
            num_samples,
        })
    }

    /// Deinterleave `[L, R, L, R, ...]` samples into a planar buffer
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], num_channels: usize) -> Self {
        if num_channels == 0 {
            return Self::default();
        }
        let frames = samples.len() / num_channels;
        let mut buffer = Self::new(num_channels, frames);
        for (i, frame) in samples.chunks_exact(num_channels).enumerate() {
            for (ch, &sample) in frame.iter().enumerate() {
                buffer.channels[ch][i] = sample;
            }
        }
        buffer
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() || self.num_samples == 0
    }

    /// Duration in seconds at the given sample rate
    pub fn duration_secs(&self, sample_rate: f64) -> f64 {
        if sample_rate > 0.0 {
            self.num_samples as f64 / sample_rate
        } else {
            0.0
        }
    }

    /// Read-only view of one channel
    ///
    /// # Panics
    /// Panics if `channel` is out of range
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Mutable view of one channel
    ///
    /// # Panics
    /// Panics if `channel` is out of range
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    /// Iterate over all channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Iterate mutably over all channels
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// True if both buffers have identical channel and sample counts
    pub fn same_shape(&self, other: &Self) -> bool {
        self.num_channels() == other.num_channels() && self.num_samples == other.num_samples
    }

    /// Resize to a new shape, zeroing all samples
    ///
    /// Existing allocations are reused; no allocation happens when the new
    /// shape fits within the previous capacity.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(num_samples, 0.0);
        }
        self.num_samples = num_samples;
    }

    /// Zero every sample
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Copy `len` samples from `source[source_channel][source_start..]`
    /// into `self[dest_channel][dest_start..]`
    ///
    /// # Panics
    /// Panics if either range is out of bounds
    pub fn copy_from(
        &mut self,
        dest_channel: usize,
        dest_start: usize,
        source: &AudioBuffer,
        source_channel: usize,
        source_start: usize,
        len: usize,
    ) {
        let src = &source.channels[source_channel][source_start..source_start + len];
        self.channels[dest_channel][dest_start..dest_start + len].copy_from_slice(src);
    }

    /// Largest absolute sample value across all channels
    pub fn magnitude(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    /// Interleave into `[L, R, L, R, ...]` order
    pub fn to_interleaved(&self) -> Vec<f32> {
        let channels = self.num_channels();
        let mut out = Vec::with_capacity(channels * self.num_samples);
        for i in 0..self.num_samples {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// A decoded file held fully in memory
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    /// Planar samples
    pub buffer: AudioBuffer,

    /// Native sample rate of the file
    pub sample_rate: f64,
}

/// Files written by an exporter for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Path of the metrics report
    pub report_path: PathBuf,

    /// Paths of exported audio files (empty in metrics-only mode)
    pub audio_paths: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buffer = AudioBuffer::new(2, 16);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 16);
        assert!(buffer.channels().all(|c| c.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn from_channels_rejects_ragged_input() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]]);
        assert!(matches!(result, Err(WorkbenchError::InvalidParameter(_))));
    }

    #[test]
    fn interleave_round_trip() {
        let interleaved = [0.1_f32, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2);
        assert_eq!(buffer.channel(0).to_vec(), vec![0.1_f32, 0.2, 0.3]);
        assert_eq!(buffer.channel(1).to_vec(), vec![-0.1_f32, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), interleaved.to_vec());
    }

    #[test]
    fn copy_from_moves_a_slice() {
        let source = AudioBuffer::from_channels(vec![vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
        let mut dest = AudioBuffer::new(1, 6);
        dest.copy_from(0, 2, &source, 0, 1, 3);
        assert_eq!(dest.channel(0).to_vec(), vec![0.0_f32, 0.0, 2.0, 3.0, 4.0, 0.0]);
    }

    #[test]
    fn set_size_reshapes_and_zeroes() {
        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0; 8], vec![1.0; 8]]).unwrap();
        buffer.set_size(2, 4);
        assert_eq!(buffer.num_samples(), 4);
        assert_eq!(buffer.magnitude(), 0.0);

        buffer.set_size(1, 10);
        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.channel(0).len(), 10);
    }

    #[test]
    fn same_shape_compares_both_dimensions() {
        let a = AudioBuffer::new(2, 10);
        assert!(a.same_shape(&AudioBuffer::new(2, 10)));
        assert!(!a.same_shape(&AudioBuffer::new(1, 10)));
        assert!(!a.same_shape(&AudioBuffer::new(2, 11)));
    }

    #[test]
    fn duration_uses_sample_rate() {
        let buffer = AudioBuffer::new(2, 88_200);
        assert!((buffer.duration_secs(44_100.0) - 2.0).abs() < 1e-9);
        assert_eq!(buffer.duration_secs(0.0), 0.0);
    }
}
