/// Whole-file audio loading using Symphonia
use crate::error::{DspError, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};
use workbench_core::{AudioBuffer, AudioLoader, LoadedAudio};

/// Fallback when a container does not declare its sample rate
const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Audio loader using Symphonia
///
/// Supports: WAV, FLAC, MP3, OGG/Vorbis, AAC/M4A
///
/// The whole file is decoded into a planar buffer at its native sample rate.
/// Only mono and stereo files are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaLoader;

impl SymphoniaLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self
    }

    /// Decode `path` into memory
    ///
    /// # Errors
    /// Returns an error if the file is missing, cannot be probed or decoded,
    /// or has a channel count other than 1 or 2
    pub fn decode(&self, path: &Path) -> Result<LoadedAudio> {
        if !path.exists() {
            return Err(DspError::FileNotFound(path.display().to_string()));
        }

        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DspError::UnsupportedFormat(format!("Failed to probe file: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| DspError::DecodeError("No audio tracks found".to_string()))?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or_else(|| {
            warn!(path = %path.display(), "sample rate not declared, assuming {}", DEFAULT_SAMPLE_RATE);
            DEFAULT_SAMPLE_RATE
        });
        let track_id = track.id;
        let declared_channels = track.codec_params.channels.map(|c| c.count());
        if let Some(count) = declared_channels {
            check_channel_count(count)?;
        }

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(symphonia::core::errors::Error::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = decoder.decode(&packet)?;

            if channels.is_empty() {
                let count = decoded.spec().channels.count();
                check_channel_count(count)?;
                channels = vec![Vec::new(); count];
            }

            append_planar(decoded, &mut channels);
        }

        let buffer = AudioBuffer::from_channels(channels)
            .map_err(|e| DspError::DecodeError(e.to_string()))?;

        debug!(
            path = %path.display(),
            sample_rate,
            channels = buffer.num_channels(),
            samples = buffer.num_samples(),
            "decoded audio file"
        );

        Ok(LoadedAudio {
            buffer,
            sample_rate: f64::from(sample_rate),
        })
    }
}

impl AudioLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> workbench_core::Result<LoadedAudio> {
        Ok(self.decode(path)?)
    }

    fn supports_format(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            matches!(
                ext.to_lowercase().as_str(),
                "wav" | "flac" | "mp3" | "ogg" | "m4a" | "aac"
            )
        } else {
            false
        }
    }
}

fn check_channel_count(count: usize) -> Result<()> {
    if count == 1 || count == 2 {
        Ok(())
    } else {
        Err(DspError::UnsupportedChannelCount(count))
    }
}

/// Append one decoded packet to the planar output
///
/// Signed integers use symmetric scaling (divide by 2^(N-1)); unsigned
/// integers are re-centred around zero.
fn append_planar(decoded: AudioBufferRef<'_>, channels: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_channels(&buf, channels, |s| s),
        AudioBufferRef::F64(buf) => extend_channels(&buf, channels, |s| s as f32),
        AudioBufferRef::S32(buf) => extend_channels(&buf, channels, |s| s as f32 / 2147483648.0),
        AudioBufferRef::S24(buf) => {
            extend_channels(&buf, channels, |s| s.inner() as f32 / 8388608.0);
        }
        AudioBufferRef::S16(buf) => extend_channels(&buf, channels, |s| f32::from(s) / 32768.0),
        AudioBufferRef::S8(buf) => extend_channels(&buf, channels, |s| f32::from(s) / 128.0),
        AudioBufferRef::U32(buf) => {
            extend_channels(&buf, channels, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U24(buf) => {
            extend_channels(&buf, channels, |s| {
                (s.inner() as f32 / 16777215.0) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U16(buf) => {
            extend_channels(&buf, channels, |s| (f32::from(s) / f32::from(u16::MAX)) * 2.0 - 1.0);
        }
        AudioBufferRef::U8(buf) => {
            extend_channels(&buf, channels, |s| (f32::from(s) / f32::from(u8::MAX)) * 2.0 - 1.0);
        }
    }
}

fn extend_channels<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    channels: &mut [Vec<f32>],
    normalize: F,
) where
    T: symphonia::core::sample::Sample + Copy,
    F: Fn(T) -> f32,
{
    for (index, out) in channels.iter_mut().enumerate() {
        out.extend(buf.chan(index).iter().map(|&s| normalize(s)));
    }
}
