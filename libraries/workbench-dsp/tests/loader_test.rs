//! Decoding synthetic WAV files through the Symphonia loader

use std::path::Path;
use tempfile::TempDir;
use workbench_core::{AudioLoader, WorkbenchError};
use workbench_dsp::{DspError, SymphoniaLoader};

fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in frames {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn stereo_wav_is_deinterleaved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    // L = 0.5, R = -0.25, 100 frames
    let interleaved: Vec<i16> = (0..100).flat_map(|_| [16_384, -8_192]).collect();
    write_wav(&path, 2, 48_000, &interleaved);

    let loaded = SymphoniaLoader::new().load(&path).unwrap();
    assert_eq!(loaded.sample_rate, 48_000.0);
    assert_eq!(loaded.buffer.num_channels(), 2);
    assert_eq!(loaded.buffer.num_samples(), 100);
    assert!(loaded.buffer.channel(0).iter().all(|&s| s == 0.5));
    assert!(loaded.buffer.channel(1).iter().all(|&s| s == -0.25));
}

#[test]
fn mono_wav_keeps_one_channel() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mono.wav");
    write_wav(&path, 1, 44_100, &vec![8_192; 441]);

    let loaded = SymphoniaLoader::new().load(&path).unwrap();
    assert_eq!(loaded.buffer.num_channels(), 1);
    assert_eq!(loaded.buffer.num_samples(), 441);
}

#[test]
fn surround_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("three.wav");
    write_wav(&path, 3, 44_100, &vec![0; 300]);

    assert!(SymphoniaLoader::new().load(&path).is_err());
}

#[test]
fn missing_file_is_reported() {
    let err = SymphoniaLoader::new()
        .decode(Path::new("/definitely/not/here.wav"))
        .unwrap_err();
    assert!(matches!(err, DspError::FileNotFound(_)));

    let err = SymphoniaLoader::new()
        .load(Path::new("/definitely/not/here.wav"))
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::FileNotFound(_)));
}

#[test]
fn supported_extensions() {
    let loader = SymphoniaLoader::new();
    assert!(loader.supports_format(Path::new("take.WAV")));
    assert!(loader.supports_format(Path::new("mix.flac")));
    assert!(!loader.supports_format(Path::new("notes.txt")));
    assert!(!loader.supports_format(Path::new("no_extension")));
}
