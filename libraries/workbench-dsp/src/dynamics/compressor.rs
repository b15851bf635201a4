/// Feed-forward dynamic range compressor
///
/// One [`Compressor`] models one detection mode's full signal chain. The two
/// modes differ only in where the ballistics sit relative to the static curve:
///
/// - **Peak**: gain computer first, then the detector smooths the dB
///   attenuation (smoothing after the nonlinearity)
/// - **RMS**: detector first on signal energy, then the gain computer
///   (smoothing before the nonlinearity)
///
/// Both channels share one control signal derived from the loudest channel.
use super::{ControlSignal, GainComputer, LevelDetector};
use workbench_core::units::decibels_to_gain;
use workbench_core::{AudioBuffer, CompressorParameters, DetectionMode, ProcessSpec};

/// Compressor fixed to one [`DetectionMode`]
#[derive(Debug, Clone)]
pub struct Compressor {
    mode: DetectionMode,
    gain_computer: GainComputer,
    detector: LevelDetector,
    makeup_db: f32,
    bypassed: bool,

    spec: ProcessSpec,
    realtime_spec: Option<ProcessSpec>,

    sidechain: ControlSignal,
    gain_reduction: AudioBuffer,
    max_gain_reduction: f32,
}

impl Compressor {
    /// Create an unprepared compressor for `mode`
    pub fn new(mode: DetectionMode) -> Self {
        let mut compressor = Self {
            mode,
            gain_computer: GainComputer::new(),
            detector: LevelDetector::new(),
            makeup_db: 0.0,
            bypassed: false,
            spec: ProcessSpec::new(0.0, 0, 2),
            realtime_spec: None,
            sidechain: ControlSignal::default(),
            gain_reduction: AudioBuffer::default(),
            max_gain_reduction: 0.0,
        };
        compressor.set_parameters(&CompressorParameters::default());
        compressor
    }

    /// Create a peak-detecting compressor
    pub fn peak() -> Self {
        Self::new(DetectionMode::Peak)
    }

    /// Create an RMS-detecting compressor
    pub fn rms() -> Self {
        Self::new(DetectionMode::Rms)
    }

    /// Detection mode
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Prepare for real-time processing
    ///
    /// Sizes the scratch buffers to `spec.block_size`, resets the detector,
    /// clears bypass and the gain-reduction state. The spec is remembered so
    /// [`prepare_for_real_time_processing`](Self::prepare_for_real_time_processing)
    /// can restore it after an offline run.
    pub fn prepare(&mut self, spec: ProcessSpec) {
        self.realtime_spec = Some(spec);
        self.bypassed = false;
        self.configure(spec);
    }

    /// Re-target to an offline chunk size and sample rate
    ///
    /// The remembered real-time spec and the bypass flag are left alone.
    pub fn prepare_for_metrics_extraction(&mut self, spec: ProcessSpec) {
        self.configure(spec);
    }

    /// Restore the spec from the last [`prepare`](Self::prepare)
    pub fn prepare_for_real_time_processing(&mut self) {
        if let Some(spec) = self.realtime_spec {
            self.configure(spec);
        }
    }

    /// Change the scratch size without touching detector state
    pub fn resize_signals(&mut self, chunk_size: usize) {
        self.sidechain.resize(chunk_size);
        self.spec.block_size = chunk_size as u32;
    }

    fn configure(&mut self, spec: ProcessSpec) {
        self.spec = spec;
        self.detector.prepare(spec.sample_rate);
        self.sidechain.resize(spec.block_size as usize);
        self.gain_reduction.set_size(spec.num_channels as usize, 0);
        self.max_gain_reduction = 0.0;
    }

    /// Active processing spec
    pub fn spec(&self) -> ProcessSpec {
        self.spec
    }

    /// Bypass (`true`) or engage (`false`) the compressor
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    /// Check if the compressor is bypassed
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Set threshold (in dB)
    pub fn set_threshold(&mut self, threshold_db: f32) {
        self.gain_computer.set_threshold(threshold_db);
    }

    /// Set ratio
    pub fn set_ratio(&mut self, ratio: f32) {
        self.gain_computer.set_ratio(ratio);
    }

    /// Set knee width (in dB)
    pub fn set_knee(&mut self, knee_db: f32) {
        self.gain_computer.set_knee(knee_db);
    }

    /// Set attack time (in ms)
    pub fn set_attack(&mut self, attack_ms: f32) {
        self.detector.set_attack(f64::from(attack_ms) * 0.001);
    }

    /// Set release time (in ms)
    pub fn set_release(&mut self, release_ms: f32) {
        self.detector.set_release(f64::from(release_ms) * 0.001);
    }

    /// Set makeup gain (in dB)
    pub fn set_makeup(&mut self, makeup_db: f32) {
        self.makeup_db = makeup_db;
    }

    /// Makeup gain in dB
    pub fn makeup(&self) -> f32 {
        self.makeup_db
    }

    /// Apply a full parameter set
    pub fn set_parameters(&mut self, params: &CompressorParameters) {
        self.set_threshold(params.threshold_db);
        self.set_ratio(params.ratio);
        self.set_knee(params.knee_db);
        self.set_attack(params.attack_ms);
        self.set_release(params.release_ms);
        self.set_makeup(params.makeup_db);
    }

    /// Current parameter set
    pub fn parameters(&self) -> CompressorParameters {
        CompressorParameters {
            threshold_db: self.gain_computer.threshold(),
            ratio: self.gain_computer.ratio(),
            knee_db: self.gain_computer.knee(),
            attack_ms: (self.detector.attack() * 1000.0) as f32,
            release_ms: (self.detector.release() * 1000.0) as f32,
            makeup_db: self.makeup_db,
        }
    }

    /// Deepest attenuation (most negative dB) of the last processed call
    pub fn max_gain_reduction(&self) -> f32 {
        self.max_gain_reduction
    }

    /// Gain-reduction signal of the last tracked call, in linear gain
    ///
    /// Makeup gain is not included.
    pub fn gain_reduction_signal(&self) -> &AudioBuffer {
        &self.gain_reduction
    }

    /// Real-time entry point
    ///
    /// No-op when bypassed. Buffers longer than the prepared block size are
    /// processed in block-sized slices, so nothing is allocated here once
    /// [`prepare`](Self::prepare) has run.
    ///
    /// # Real-Time Constraints
    /// - No allocations
    /// - No blocking operations
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.bypassed {
            return;
        }

        // Unprepared: nothing sensible to do on the audio thread
        let block = self.spec.block_size as usize;
        if block == 0 {
            return;
        }

        self.max_gain_reduction = 0.0;
        let num_samples = buffer.num_samples();
        let num_channels = buffer.num_channels();
        let mut offset = 0;
        while offset < num_samples {
            let len = block.min(num_samples - offset);
            self.compress(buffer, offset, len, num_channels, false);
            offset += len;
        }
    }

    /// Chunk-addressable entry point for offline analysis
    ///
    /// Compresses `buffer[..num_channels][..num_samples]` regardless of the
    /// prepared block size. With `track_gr` the linear gain-reduction signal
    /// of this call is kept for [`gain_reduction_signal`](Self::gain_reduction_signal).
    pub fn apply_compression(
        &mut self,
        buffer: &mut AudioBuffer,
        num_samples: usize,
        num_channels: usize,
        track_gr: bool,
    ) {
        self.max_gain_reduction = 0.0;
        self.compress(buffer, 0, num_samples, num_channels, track_gr);
    }

    fn compress(
        &mut self,
        buffer: &mut AudioBuffer,
        offset: usize,
        len: usize,
        num_channels: usize,
        track_gr: bool,
    ) {
        self.sidechain.resize(len);
        self.sidechain.load_sidechain(buffer, offset, num_channels);

        match self.mode {
            DetectionMode::Peak => {
                self.sidechain.apply_gain_computer(&self.gain_computer);
                self.sidechain.apply_peak_detector(&mut self.detector);
            }
            DetectionMode::Rms => {
                self.sidechain.apply_rms_detector(&mut self.detector);
                self.sidechain.apply_gain_computer(&self.gain_computer);
            }
        }

        self.max_gain_reduction = self
            .max_gain_reduction
            .min(self.sidechain.deepest_attenuation());

        if track_gr {
            self.save_gain_reduction(num_channels);
        }

        self.sidechain.convert_to_gain(self.makeup_db);
        let gains = self.sidechain.as_slice();
        for channel in buffer.channels_mut().take(num_channels) {
            for (sample, gain) in channel[offset..offset + len].iter_mut().zip(gains) {
                *sample *= gain;
            }
        }
    }

    fn save_gain_reduction(&mut self, num_channels: usize) {
        let attenuation = self.sidechain.as_slice();
        self.gain_reduction.set_size(num_channels, attenuation.len());
        for channel in self.gain_reduction.channels_mut() {
            for (out, &db) in channel.iter_mut().zip(attenuation) {
                *out = decibels_to_gain(db);
            }
        }
    }
}

/// One compressor per detection mode, with fully independent parameters
///
/// Making the peak/RMS duality an explicit pair removes any notion of a
/// "currently active" mode inside a single compressor.
#[derive(Debug, Clone)]
pub struct CompressorPair {
    peak: Compressor,
    rms: Compressor,
}

impl CompressorPair {
    /// Create an unprepared pair
    pub fn new() -> Self {
        Self {
            peak: Compressor::peak(),
            rms: Compressor::rms(),
        }
    }

    /// Prepare both compressors
    pub fn prepare(&mut self, spec: ProcessSpec) {
        self.peak.prepare(spec);
        self.rms.prepare(spec);
    }

    /// Peak compressor
    pub fn peak(&self) -> &Compressor {
        &self.peak
    }

    /// Mutable peak compressor
    pub fn peak_mut(&mut self) -> &mut Compressor {
        &mut self.peak
    }

    /// RMS compressor
    pub fn rms(&self) -> &Compressor {
        &self.rms
    }

    /// Mutable RMS compressor
    pub fn rms_mut(&mut self) -> &mut Compressor {
        &mut self.rms
    }

    /// Compressor for `mode`
    pub fn get(&self, mode: DetectionMode) -> &Compressor {
        match mode {
            DetectionMode::Peak => &self.peak,
            DetectionMode::Rms => &self.rms,
        }
    }

    /// Mutable compressor for `mode`
    pub fn get_mut(&mut self, mode: DetectionMode) -> &mut Compressor {
        match mode {
            DetectionMode::Peak => &mut self.peak,
            DetectionMode::Rms => &mut self.rms,
        }
    }

    /// Bypass or engage both compressors
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.peak.set_bypassed(bypassed);
        self.rms.set_bypassed(bypassed);
    }

    /// Real-time entry point: run the compressor selected by `mode`
    pub fn process(&mut self, buffer: &mut AudioBuffer, mode: DetectionMode) {
        self.get_mut(mode).process(buffer);
    }

    /// Offline peak compression of one chunk
    pub fn apply_peak_compression(
        &mut self,
        buffer: &mut AudioBuffer,
        num_samples: usize,
        num_channels: usize,
        track_gr: bool,
    ) {
        self.peak
            .apply_compression(buffer, num_samples, num_channels, track_gr);
    }

    /// Offline RMS compression of one chunk
    pub fn apply_rms_compression(
        &mut self,
        buffer: &mut AudioBuffer,
        num_samples: usize,
        num_channels: usize,
        track_gr: bool,
    ) {
        self.rms
            .apply_compression(buffer, num_samples, num_channels, track_gr);
    }

    /// Re-target both compressors for an offline run
    pub fn prepare_for_metrics_extraction(&mut self, spec: ProcessSpec) {
        self.peak.prepare_for_metrics_extraction(spec);
        self.rms.prepare_for_metrics_extraction(spec);
    }

    /// Restore both compressors to their real-time spec
    pub fn prepare_for_real_time_processing(&mut self) {
        self.peak.prepare_for_real_time_processing();
        self.rms.prepare_for_real_time_processing();
    }

    /// Change both scratch sizes
    pub fn resize_signals(&mut self, chunk_size: usize) {
        self.peak.resize_signals(chunk_size);
        self.rms.resize_signals(chunk_size);
    }
}

impl Default for CompressorPair {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 48_000.0;

    fn dc_buffer(value: f32, channels: usize, len: usize) -> AudioBuffer {
        AudioBuffer::from_channels(vec![vec![value; len]; channels]).unwrap()
    }

    fn params(threshold_db: f32, ratio: f32) -> CompressorParameters {
        CompressorParameters {
            threshold_db,
            ratio,
            knee_db: 0.0,
            attack_ms: 1.0,
            release_ms: 10.0,
            makeup_db: 0.0,
        }
    }

    #[test]
    fn below_threshold_is_transparent() {
        let mut comp = Compressor::peak();
        comp.set_parameters(&params(-6.0, 4.0));
        comp.prepare(ProcessSpec::new(FS, 256, 2));

        let mut buffer = dc_buffer(0.25, 2, 256);
        comp.process(&mut buffer);

        assert!(buffer.channels().all(|c| c.iter().all(|&s| s == 0.25)));
        assert_eq!(comp.max_gain_reduction(), 0.0);
    }

    #[test]
    fn bypassed_compressor_is_untouched() {
        let mut comp = Compressor::rms();
        comp.set_parameters(&params(-40.0, 10.0));
        comp.prepare(ProcessSpec::new(FS, 128, 2));
        comp.set_bypassed(true);

        let mut buffer = dc_buffer(0.9, 2, 128);
        comp.process(&mut buffer);
        assert!(buffer.channels().all(|c| c.iter().all(|&s| s == 0.9)));
    }

    #[test]
    fn prepare_clears_bypass() {
        let mut comp = Compressor::peak();
        comp.set_bypassed(true);
        comp.prepare(ProcessSpec::new(FS, 64, 2));
        assert!(!comp.is_bypassed());
    }

    #[test]
    fn peak_mode_converges_on_static_curve() {
        let mut comp = Compressor::peak();
        comp.set_parameters(&params(-20.0, 4.0));
        comp.prepare(ProcessSpec::new(FS, 4800, 1));

        // 0.5 = -6.02 dB, overshoot 13.98 dB, reduction 10.49 dB
        let mut buffer = dc_buffer(0.5, 1, 4800);
        comp.apply_compression(&mut buffer, 4800, 1, true);

        let expected_db = -0.75 * (-6.0206 + 20.0);
        let gr = comp.gain_reduction_signal().channel(0)[4799];
        assert!((workbench_core::units::gain_to_decibels(gr) - expected_db).abs() < 0.01);
    }

    #[test]
    fn process_larger_than_block_matches_single_pass() {
        let mut chunked = Compressor::peak();
        chunked.set_parameters(&params(-20.0, 4.0));
        chunked.prepare(ProcessSpec::new(FS, 64, 2));

        let mut whole = chunked.clone();
        whole.prepare_for_metrics_extraction(ProcessSpec::new(FS, 1000, 2));

        let source: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.05).sin()).collect();
        let mut a = AudioBuffer::from_channels(vec![source.clone(), source.clone()]).unwrap();
        let mut b = a.clone();

        chunked.process(&mut a);
        whole.apply_compression(&mut b, 1000, 2, false);
        assert_eq!(a, b);
    }

    #[test]
    fn makeup_is_excluded_from_gain_reduction_signal() {
        let mut comp = Compressor::peak();
        comp.set_parameters(&CompressorParameters {
            makeup_db: 6.0,
            ..params(0.0, 4.0)
        });
        comp.prepare(ProcessSpec::new(FS, 32, 2));

        let mut buffer = dc_buffer(0.5, 2, 32);
        comp.apply_compression(&mut buffer, 32, 2, true);

        let gr = comp.gain_reduction_signal();
        assert_eq!(gr.num_channels(), 2);
        assert!(gr.channels().all(|c| c.iter().all(|&g| g == 1.0)));
        // makeup only: 0.5 * 10^(6/20)
        assert!((buffer.channel(0)[0] - 0.5 * 1.995_262_3).abs() < 1e-5);
    }

    #[test]
    fn extraction_spec_is_restored() {
        let mut pair = CompressorPair::new();
        pair.prepare(ProcessSpec::new(FS, 512, 2));

        pair.prepare_for_metrics_extraction(ProcessSpec::new(44_100.0, 1024, 2));
        assert_eq!(pair.peak().spec().block_size, 1024);
        assert_eq!(pair.rms().spec().sample_rate, 44_100.0);

        pair.prepare_for_real_time_processing();
        assert_eq!(pair.peak().spec(), ProcessSpec::new(FS, 512, 2));
        assert_eq!(pair.rms().spec(), ProcessSpec::new(FS, 512, 2));
    }

    #[test]
    fn pair_parameters_are_independent() {
        let mut pair = CompressorPair::new();
        pair.peak_mut().set_threshold(-30.0);
        pair.rms_mut().set_ratio(8.0);

        assert_eq!(pair.peak().parameters().threshold_db, -30.0);
        assert_eq!(pair.rms().parameters().threshold_db, 0.0);
        assert_eq!(pair.peak().parameters().ratio, 3.0);
        assert_eq!(pair.rms().parameters().ratio, 8.0);
    }

    #[test]
    fn parameters_round_trip_through_setters() {
        let mut comp = Compressor::rms();
        let wanted = CompressorParameters {
            threshold_db: -18.0,
            ratio: 6.0,
            knee_db: 3.0,
            attack_ms: 20.0,
            release_ms: 200.0,
            makeup_db: 2.0,
        };
        comp.set_parameters(&wanted);
        let got = comp.parameters();
        assert_eq!(got.threshold_db, wanted.threshold_db);
        assert!((got.attack_ms - 20.0).abs() < 1e-4);
        assert!((got.release_ms - 200.0).abs() < 1e-3);
    }
}
