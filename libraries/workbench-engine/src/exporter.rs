//! Report and audio export
//!
//! Files go into `<base_directory>/<folder_name>/` and are named after the
//! analysed file: `<stem>_Metrics.txt`, `<stem>_Peak_compressed.wav`,
//! `<stem>_RMS_compressed.wav`. An existing name is never overwritten;
//! `_2`, `_3`, ... is appended before the extension instead.

use crate::config::ExportSettings;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use workbench_core::{AudioBuffer, ExportSummary, ReportExporter, Result, WorkbenchError};

const METRICS_SUFFIX: &str = "Metrics";
const PEAK_SUFFIX: &str = "Peak_compressed";
const RMS_SUFFIX: &str = "RMS_compressed";

/// First free path of the form `<folder>/<stem>_<suffix>[_N].<extension>`
pub fn unique_file_path(folder: &Path, stem: &str, suffix: &str, extension: &str) -> PathBuf {
    let base = format!("{stem}_{suffix}");
    let mut candidate = folder.join(format!("{base}.{extension}"));
    let mut counter = 2_u32;
    while candidate.exists() {
        candidate = folder.join(format!("{base}_{counter}.{extension}"));
        counter += 1;
    }
    candidate
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

fn wav_error(path: &Path, err: hound::Error) -> WorkbenchError {
    WorkbenchError::export(format!("Failed to write {}: {err}", path.display()))
}

/// Write `buffer` as a WAV file with the given bit depth
///
/// 16 and 24 bits are written as integer PCM (clipped to full scale),
/// 32 bits as float.
pub fn write_wav(path: &Path, buffer: &AudioBuffer, sample_rate: f64, bit_depth: u16) -> Result<()> {
    if !(sample_rate.is_finite() && sample_rate >= 1.0) {
        return Err(WorkbenchError::export(format!(
            "Invalid sample rate for WAV export: {sample_rate}"
        )));
    }

    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(WorkbenchError::invalid_parameter(format!(
                "Unsupported WAV bit depth: {other}"
            )))
        }
    };

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| wav_error(path, e))?;
    let interleaved = buffer.to_interleaved();

    match bit_depth {
        16 => {
            for &sample in &interleaved {
                let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
                writer.write_sample(value).map_err(|e| wav_error(path, e))?;
            }
        }
        24 => {
            const MAX_24: f32 = 8_388_607.0;
            for &sample in &interleaved {
                let value = (sample.clamp(-1.0, 1.0) * MAX_24).round() as i32;
                writer.write_sample(value).map_err(|e| wav_error(path, e))?;
            }
        }
        _ => {
            for &sample in &interleaved {
                writer.write_sample(sample).map_err(|e| wav_error(path, e))?;
            }
        }
    }

    writer.finalize().map_err(|e| wav_error(path, e))
}

/// File-system exporter for one workbench session
#[derive(Debug, Clone)]
pub struct DataExporter {
    settings: ExportSettings,
}

impl DataExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Switch audio export on or off
    pub fn set_export_wavs(&mut self, export_wavs: bool) {
        self.settings.export_wavs = export_wavs;
    }

    /// Create the output folder if needed and return it
    pub fn ensure_output_folder(&self) -> Result<PathBuf> {
        let folder = self.settings.output_folder();
        if !folder.is_dir() {
            fs::create_dir_all(&folder).map_err(|e| {
                WorkbenchError::export(format!(
                    "Failed to create output folder {}: {e}",
                    folder.display()
                ))
            })?;
            debug!(folder = %folder.display(), "Created output folder");
        }
        Ok(folder)
    }

    /// Write only the report text
    pub fn export_metrics_only(&self, input: &Path, report: &str) -> Result<PathBuf> {
        let folder = self.ensure_output_folder()?;
        let path = unique_file_path(&folder, &file_stem(input), METRICS_SUFFIX, "txt");
        fs::write(&path, report).map_err(|e| {
            WorkbenchError::export(format!("Failed to write {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "Saved metrics report");
        Ok(path)
    }

    fn export_audio(
        &self,
        folder: &Path,
        stem: &str,
        suffix: &str,
        buffer: &AudioBuffer,
        sample_rate: f64,
    ) -> Result<PathBuf> {
        let path = unique_file_path(folder, stem, suffix, "wav");
        write_wav(&path, buffer, sample_rate, self.settings.bit_depth)?;
        info!(path = %path.display(), "Saved compressed audio");
        Ok(path)
    }
}

impl ReportExporter for DataExporter {
    fn export_all(
        &mut self,
        input: &Path,
        report: &str,
        peak: Option<&AudioBuffer>,
        rms: Option<&AudioBuffer>,
        sample_rate: f64,
    ) -> Result<ExportSummary> {
        let report_path = self.export_metrics_only(input, report)?;
        let mut summary = ExportSummary {
            report_path,
            audio_paths: Vec::new(),
        };

        if !self.settings.export_wavs {
            return Ok(summary);
        }

        let folder = self.ensure_output_folder()?;
        let stem = file_stem(input);
        for (suffix, buffer) in [(PEAK_SUFFIX, peak), (RMS_SUFFIX, rms)] {
            if let Some(buffer) = buffer {
                let path = self.export_audio(&folder, &stem, suffix, buffer, sample_rate)?;
                summary.audio_paths.push(path);
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn exporter(dir: &TempDir, export_wavs: bool) -> DataExporter {
        DataExporter::new(ExportSettings {
            base_directory: dir.path().to_path_buf(),
            folder_name: "results".to_string(),
            export_wavs,
            bit_depth: 24,
        })
    }

    fn buffer() -> AudioBuffer {
        AudioBuffer::from_channels(vec![vec![0.5, -0.5, 0.25], vec![0.0, 1.0, -1.0]]).unwrap()
    }

    #[test]
    fn exports_report_and_both_wavs() {
        let dir = TempDir::new().unwrap();
        let mut exporter = exporter(&dir, true);
        let audio = buffer();

        let summary = exporter
            .export_all(Path::new("/music/loop.wav"), "report", Some(&audio), Some(&audio), 48_000.0)
            .unwrap();

        let folder = dir.path().join("results");
        assert_eq!(summary.report_path, folder.join("loop_Metrics.txt"));
        assert_eq!(
            summary.audio_paths,
            vec![
                folder.join("loop_Peak_compressed.wav"),
                folder.join("loop_RMS_compressed.wav")
            ]
        );
        assert_eq!(fs::read_to_string(&summary.report_path).unwrap(), "report");

        let reader = hound::WavReader::open(&summary.audio_paths[0]).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 48_000);
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.len(), 6);
    }

    #[test]
    fn repeated_exports_get_numbered_names() {
        let dir = TempDir::new().unwrap();
        let exporter = exporter(&dir, false);
        let input = Path::new("take.flac");

        let first = exporter.export_metrics_only(input, "one").unwrap();
        let second = exporter.export_metrics_only(input, "two").unwrap();
        let third = exporter.export_metrics_only(input, "three").unwrap();

        assert!(first.ends_with("take_Metrics.txt"));
        assert!(second.ends_with("take_Metrics_2.txt"));
        assert!(third.ends_with("take_Metrics_3.txt"));
        assert_eq!(fs::read_to_string(first).unwrap(), "one");
    }

    #[test]
    fn metrics_only_mode_skips_audio() {
        let dir = TempDir::new().unwrap();
        let mut exporter = exporter(&dir, false);
        let audio = buffer();

        let summary = exporter
            .export_all(Path::new("a.wav"), "text", Some(&audio), Some(&audio), 44_100.0)
            .unwrap();

        assert!(summary.audio_paths.is_empty());
        assert!(summary.report_path.exists());
        assert!(!dir.path().join("results").join("a_Peak_compressed.wav").exists());
    }

    #[test]
    fn wav_samples_round_trip_through_sixteen_bits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &buffer(), 44_100.0, 16).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        // Interleaved L R L R L R
        assert_eq!(samples, vec![16_384, 0, -16_384, 32_767, 8_192, -32_767]);
    }

    #[test]
    fn float_export_keeps_exact_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &buffer(), 44_100.0, 32).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, buffer().to_interleaved());
    }

    #[test]
    fn bad_bit_depth_and_rate_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        assert!(matches!(
            write_wav(&path, &buffer(), 44_100.0, 8),
            Err(WorkbenchError::InvalidParameter(_))
        ));
        assert!(matches!(
            write_wav(&path, &buffer(), 0.0, 16),
            Err(WorkbenchError::Export(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn unique_paths_never_collide(existing in 0usize..6) {
            let dir = TempDir::new().unwrap();
            let mut seen = Vec::new();
            for _ in 0..=existing {
                let path = unique_file_path(dir.path(), "song", "Metrics", "txt");
                prop_assert!(!path.exists());
                prop_assert!(!seen.contains(&path));
                fs::write(&path, "x").unwrap();
                seen.push(path);
            }
        }
    }
}
