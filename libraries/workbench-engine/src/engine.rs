//! Offline metrics extraction
//!
//! One run loads a file, compresses it with both detectors in fixed-size
//! chunks, extracts metrics for the three signal roles, and exports the
//! report together with the compressed audio.
//!
//! ```text
//! Idle ─► Loading ─► Compressing ─► ComputingMetrics ─► Exporting ─► Idle
//!            │            │                 │                │
//!            └────────────┴────── error ────┴────────────────┴─► Idle (failed)
//! ```

use crate::config::WorkbenchConfig;
use crate::error::{EngineError, Result};
use crate::exporter::DataExporter;
use crate::params::ParameterStore;
use crate::processor::SharedCompressors;
use crate::status::{EngineState, EngineStatus, RunGuard};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use workbench_core::{
    AudioBuffer, AudioLoader, DetectionMode, ExportSummary, LoadedAudio, ProcessSpec,
    ReportExporter, WorkbenchError,
};
use workbench_dsp::{CompressorPair, SymphoniaLoader};
use workbench_metrics::{build_report, CompressionMetrics, Metrics, MetricsInput};

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Full text of the metrics report
    pub report: String,
    /// Metrics of the input as loaded
    pub uncompressed: CompressionMetrics,
    /// Metrics of the peak-detection output
    pub peak: CompressionMetrics,
    /// Metrics of the RMS-detection output
    pub rms: CompressionMetrics,
    /// Files written by the exporter
    pub export: ExportSummary,
    /// Native sample rate of the analysed file
    pub sample_rate: f64,
}

/// Output of the chunked compression stage
struct CompressedSignals {
    peak: AudioBuffer,
    peak_gain_reduction: AudioBuffer,
    rms: AudioBuffer,
    rms_gain_reduction: AudioBuffer,
}

/// Exclusive use of the shared compressors for one offline run
///
/// While alive the live path is suspended and both compressors run
/// un-bypassed at the file's rate and the offline chunk size. Dropping it
/// restores the real-time spec and the previous bypass states, on success
/// and on error alike.
struct ExtractionSession<'a> {
    compressors: &'a SharedCompressors,
    pair: MutexGuard<'a, CompressorPair>,
    bypassed: [bool; 2],
}

impl<'a> ExtractionSession<'a> {
    fn begin(
        compressors: &'a SharedCompressors,
        params: &ParameterStore,
        spec: ProcessSpec,
    ) -> Self {
        compressors.set_suspended(true);
        let mut pair = compressors.lock();

        let bypassed = [pair.peak().is_bypassed(), pair.rms().is_bypassed()];
        pair.set_bypassed(false);
        for mode in DetectionMode::ALL {
            pair.get_mut(mode)
                .set_parameters(&params.compressor_parameters(mode));
        }
        pair.prepare_for_metrics_extraction(spec);

        Self {
            compressors,
            pair,
            bypassed,
        }
    }
}

impl Drop for ExtractionSession<'_> {
    fn drop(&mut self) {
        self.pair.prepare_for_real_time_processing();
        self.pair.peak_mut().set_bypassed(self.bypassed[0]);
        self.pair.rms_mut().set_bypassed(self.bypassed[1]);
        self.compressors.set_suspended(false);
        debug!("Restored real-time compressor configuration");
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs peak vs RMS metrics extraction on whole files
///
/// Share it behind an `Arc` to start runs from a worker thread and poll
/// [`status`](Self::status) elsewhere. Only one run is accepted at a time.
pub struct MetricsExtractionEngine {
    config: WorkbenchConfig,
    loader: Mutex<Box<dyn AudioLoader>>,
    exporter: Mutex<Box<dyn ReportExporter>>,
    compressors: Arc<SharedCompressors>,
    params: Arc<ParameterStore>,
    metrics: Mutex<Metrics>,
    status: Arc<EngineStatus>,
}

impl std::fmt::Debug for MetricsExtractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExtractionEngine")
            .field("config", &self.config)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl MetricsExtractionEngine {
    /// Create an engine with the symphonia loader and the file-system exporter
    pub fn new(
        config: WorkbenchConfig,
        compressors: Arc<SharedCompressors>,
        params: Arc<ParameterStore>,
    ) -> Result<Self> {
        let exporter = DataExporter::new(config.export.clone());
        Self::with_collaborators(
            config,
            Box::new(SymphoniaLoader::new()),
            Box::new(exporter),
            compressors,
            params,
        )
    }

    /// Create an engine with custom loader and exporter
    pub fn with_collaborators(
        config: WorkbenchConfig,
        loader: Box<dyn AudioLoader>,
        exporter: Box<dyn ReportExporter>,
        compressors: Arc<SharedCompressors>,
        params: Arc<ParameterStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            metrics: Mutex::new(Metrics::new(config.metrics.clone())),
            config,
            loader: Mutex::new(loader),
            exporter: Mutex::new(exporter),
            compressors,
            params,
            status: EngineStatus::new(),
        })
    }

    /// Validated configuration the engine was built with
    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Shared run status
    pub fn status(&self) -> Arc<EngineStatus> {
        Arc::clone(&self.status)
    }

    /// True while a run is in flight
    pub fn is_processing(&self) -> bool {
        self.status.is_processing()
    }

    /// Progress of the current or last run, `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        self.status.progress()
    }

    /// Run an extraction on the calling thread
    ///
    /// # Errors
    /// Fails if the file is missing, another run is active, the file cannot
    /// be decoded or is too long, metric extraction rejects the signals, or
    /// the export fails. The engine is idle again when this returns.
    pub fn run(&self, path: &Path) -> Result<RunReport> {
        if !path.exists() {
            return Err(EngineError::FileNotFound(path.to_path_buf()));
        }
        let guard = self.status.try_begin()?;
        self.run_claimed(path, guard)
    }

    /// Start an extraction on a background thread
    ///
    /// The missing-file and already-processing checks happen before this
    /// returns; everything else is reported through the join handle.
    pub fn start(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> Result<JoinHandle<Result<RunReport>>> {
        let path = path.into();
        if !path.exists() {
            return Err(EngineError::FileNotFound(path));
        }
        let guard = self.status.try_begin()?;
        let engine = Arc::clone(self);
        Ok(thread::spawn(move || engine.run_claimed(&path, guard)))
    }

    fn run_claimed(&self, path: &Path, guard: RunGuard) -> Result<RunReport> {
        info!(path = %path.display(), "Starting metrics extraction");

        match self.execute(path, &guard) {
            Ok(report) => {
                guard.succeed();
                info!(
                    path = %path.display(),
                    report = %report.export.report_path.display(),
                    "Metrics extraction finished"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Metrics extraction failed");
                Err(e)
            }
        }
    }

    fn execute(&self, path: &Path, guard: &RunGuard) -> Result<RunReport> {
        let audio = self.load(path)?;
        let sample_rate = audio.sample_rate;

        guard.status().enter(EngineState::Compressing);
        let compressed = self.compress(&audio);

        guard.status().enter(EngineState::ComputingMetrics);
        let mut run = self.compute_metrics(path, &audio, &compressed)?;

        guard.status().enter(EngineState::Exporting);
        run.export = lock(&self.exporter).export_all(
            path,
            &run.report,
            Some(&compressed.peak),
            Some(&compressed.rms),
            sample_rate,
        )?;

        Ok(run)
    }

    fn load(&self, path: &Path) -> Result<LoadedAudio> {
        let audio = lock(&self.loader).load(path)?;

        let channels = audio.buffer.num_channels();
        if !(1..=2).contains(&channels) {
            return Err(WorkbenchError::UnsupportedChannelCount(channels).into());
        }
        if audio.buffer.is_empty() {
            return Err(
                WorkbenchError::decode(format!("{} contains no audio", path.display())).into(),
            );
        }

        let duration_minutes = audio.buffer.duration_secs(audio.sample_rate) / 60.0;
        let limit_minutes = self.config.engine.max_duration_minutes;
        if limit_minutes > 0.0 && duration_minutes > limit_minutes {
            return Err(EngineError::TooLong {
                path: path.to_path_buf(),
                duration_minutes,
                limit_minutes,
            });
        }

        debug!(
            sample_rate = audio.sample_rate,
            channels,
            samples = audio.buffer.num_samples(),
            "Loaded input"
        );
        Ok(audio)
    }

    fn compress(&self, audio: &LoadedAudio) -> CompressedSignals {
        let input = &audio.buffer;
        let channels = input.num_channels();
        let total = input.num_samples();
        let chunk_size = self.config.engine.chunk_size;

        let mut peak = AudioBuffer::new(channels, total);
        let mut peak_gain_reduction = AudioBuffer::new(channels, total);
        let mut rms = AudioBuffer::new(channels, total);
        let mut rms_gain_reduction = AudioBuffer::new(channels, total);
        let mut chunk = AudioBuffer::new(channels, chunk_size);

        let spec = ProcessSpec::new(audio.sample_rate, chunk_size as u32, channels as u32);
        let mut session = ExtractionSession::begin(&self.compressors, &self.params, spec);

        for mode in DetectionMode::ALL {
            let (output, gain_reduction) = match mode {
                DetectionMode::Peak => (&mut peak, &mut peak_gain_reduction),
                DetectionMode::Rms => (&mut rms, &mut rms_gain_reduction),
            };

            let mut start = 0;
            while start < total {
                let len = chunk_size.min(total - start);
                chunk.set_size(channels, len);
                for ch in 0..channels {
                    chunk.copy_from(ch, 0, input, ch, start, len);
                }

                let compressor = session.pair.get_mut(mode);
                compressor.apply_compression(&mut chunk, len, channels, true);

                for ch in 0..channels {
                    output.copy_from(ch, start, &chunk, ch, 0, len);
                    gain_reduction.copy_from(
                        ch,
                        start,
                        compressor.gain_reduction_signal(),
                        ch,
                        0,
                        len,
                    );
                }
                start += len;
            }
        }

        drop(session);
        debug!(samples = total, chunk_size, "Compressed input with both detectors");

        CompressedSignals {
            peak,
            peak_gain_reduction,
            rms,
            rms_gain_reduction,
        }
    }

    fn compute_metrics(
        &self,
        path: &Path,
        audio: &LoadedAudio,
        compressed: &CompressedSignals,
    ) -> Result<RunReport> {
        let mut metrics = lock(&self.metrics);
        metrics.prepare(audio.sample_rate);
        metrics.extract_metrics(
            &MetricsInput::new(&audio.buffer)
                .with_peak(&compressed.peak, &compressed.peak_gain_reduction)
                .with_rms(&compressed.rms, &compressed.rms_gain_reduction),
        )?;

        let peak_params = self.params.compressor_parameters(DetectionMode::Peak);
        let rms_params = self.params.compressor_parameters(DetectionMode::Rms);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let report = build_report(
            &file_name,
            metrics.uncompressed_metrics(),
            (&peak_params, metrics.peak_metrics()),
            (&rms_params, metrics.rms_metrics()),
        );

        Ok(RunReport {
            report,
            uncompressed: metrics.uncompressed_metrics().clone(),
            peak: metrics.peak_metrics().clone(),
            rms: metrics.rms_metrics().clone(),
            export: ExportSummary::default(),
            sample_rate: audio.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader returning a fixed buffer
    struct FixedLoader {
        audio: LoadedAudio,
    }

    impl AudioLoader for FixedLoader {
        fn load(&self, _path: &Path) -> workbench_core::Result<LoadedAudio> {
            Ok(self.audio.clone())
        }

        fn supports_format(&self, _path: &Path) -> bool {
            true
        }
    }

    /// Exporter that records calls and can be told to fail
    struct RecordingExporter {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ReportExporter for RecordingExporter {
        fn export_all(
            &mut self,
            input: &Path,
            _report: &str,
            peak: Option<&AudioBuffer>,
            rms: Option<&AudioBuffer>,
            _sample_rate: f64,
        ) -> workbench_core::Result<ExportSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(peak.is_some() && rms.is_some());
            if self.fail {
                return Err(WorkbenchError::export("disk full"));
            }
            Ok(ExportSummary {
                report_path: input.with_extension("txt"),
                audio_paths: Vec::new(),
            })
        }
    }

    fn tone(channels: usize, samples: usize) -> LoadedAudio {
        let data: Vec<f32> = (0..samples).map(|i| (i as f32 * 0.0627).sin()).collect();
        LoadedAudio {
            buffer: AudioBuffer::from_channels(vec![data; channels]).unwrap(),
            sample_rate: 8_000.0,
        }
    }

    fn engine(
        audio: LoadedAudio,
        fail_export: bool,
    ) -> (MetricsExtractionEngine, Arc<SharedCompressors>, Arc<AtomicUsize>) {
        let compressors = SharedCompressors::new();
        compressors.lock().prepare(ProcessSpec::new(48_000.0, 256, 2));
        let params = Arc::new(ParameterStore::new());
        params.set("peak_threshold", -20.0).unwrap();
        params.set("rms_threshold", -20.0).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let engine = MetricsExtractionEngine::with_collaborators(
            WorkbenchConfig::default(),
            Box::new(FixedLoader { audio }),
            Box::new(RecordingExporter {
                calls: Arc::clone(&calls),
                fail: fail_export,
            }),
            Arc::clone(&compressors),
            params,
        )
        .unwrap();
        (engine, compressors, calls)
    }

    fn existing_file() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn missing_file_is_rejected_before_starting() {
        let (engine, _, calls) = engine(tone(2, 4_000), false);
        let result = engine.run(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(EngineError::FileNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.status().last_outcome(), crate::status::RunOutcome::None);
    }

    #[test]
    fn successful_run_compresses_and_restores() {
        let (engine, compressors, calls) = engine(tone(2, 20_000), false);
        let file = existing_file();

        let report = engine.run(file.path()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.progress(), 1.0);
        assert!(!engine.is_processing());
        assert!(report.peak.gain_reduction.unwrap().max_db > 0.0);
        assert!(report.rms.gain_reduction.unwrap().max_db > 0.0);
        assert!(report.report.contains("Threshold: -20, Ratio: 3"));

        let pair = compressors.lock();
        assert_eq!(pair.peak().spec(), ProcessSpec::new(48_000.0, 256, 2));
        assert_eq!(pair.rms().spec(), ProcessSpec::new(48_000.0, 256, 2));
        assert!(!compressors.is_suspended());
    }

    #[test]
    fn bypass_state_survives_a_run() {
        let (engine, compressors, _) = engine(tone(1, 10_000), false);
        compressors.lock().set_bypassed(true);

        let report = engine.run(existing_file().path()).unwrap();
        // The offline run itself was not bypassed
        assert!(report.peak.gain_reduction.unwrap().max_db > 0.0);

        let pair = compressors.lock();
        assert!(pair.peak().is_bypassed());
        assert!(pair.rms().is_bypassed());
    }

    #[test]
    fn export_failure_still_restores_everything() {
        let (engine, compressors, calls) = engine(tone(2, 10_000), true);

        let result = engine.run(existing_file().path());

        assert!(matches!(
            result,
            Err(EngineError::Workbench(WorkbenchError::Export(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!engine.is_processing());
        assert_eq!(engine.status().last_outcome(), crate::status::RunOutcome::Failed);
        assert_eq!(compressors.lock().peak().spec().block_size, 256);
    }

    #[test]
    fn unsupported_channel_count_fails_before_compression() {
        let (engine, compressors, calls) = engine(tone(3, 1_000), false);
        let result = engine.run(existing_file().path());

        assert!(matches!(
            result,
            Err(EngineError::Workbench(WorkbenchError::UnsupportedChannelCount(3)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(compressors.lock().peak().spec().sample_rate, 48_000.0);
    }

    #[test]
    fn busy_engine_rejects_a_second_run() {
        let (engine, _, _) = engine(tone(2, 1_000), false);
        let status = engine.status();
        let guard = status.try_begin().unwrap();

        assert!(matches!(
            engine.run(existing_file().path()),
            Err(EngineError::AlreadyProcessing)
        ));
        drop(guard);
        assert!(engine.run(existing_file().path()).is_ok());
    }

    #[test]
    fn background_run_reports_through_the_handle() {
        let (engine, _, calls) = engine(tone(2, 8_000), false);
        let engine = Arc::new(engine);
        let file = existing_file();

        let handle = engine.start(file.path()).unwrap();
        let report = handle.join().unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.report.starts_with("Metrics Summary for: "));
        assert!(!engine.is_processing());
    }
}
