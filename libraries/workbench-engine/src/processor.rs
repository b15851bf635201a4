//! Live audio path
//!
//! The real-time callback and the offline engine share one
//! [`CompressorPair`]. While an extraction run holds it, the callback
//! passes audio through untouched instead of waiting.

use crate::params::ParameterStore;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use workbench_core::units::gain_to_decibels;
use workbench_core::{AudioBuffer, ProcessSpec};
use workbench_dsp::{CompressorPair, LevelEnvelopeFollower};

/// Peak decay of the input and output meters
const METER_DECAY_SECS: f32 = 0.3;

/// Compressor pair shared by the live path and the extraction engine
#[derive(Debug, Default)]
pub struct SharedCompressors {
    pair: Mutex<CompressorPair>,
    suspended: AtomicBool,
}

impl SharedCompressors {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocking access for non-real-time callers
    pub fn lock(&self) -> MutexGuard<'_, CompressorPair> {
        self.pair.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-blocking access; `None` while suspended or held elsewhere
    pub fn try_lock(&self) -> Option<MutexGuard<'_, CompressorPair>> {
        if self.is_suspended() {
            return None;
        }
        match self.pair.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// True while an offline run owns the compressors
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub(crate) fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }
}

/// Meter values published by the live path, in dB
#[derive(Debug)]
pub struct MeterReadings {
    input_db: AtomicU32,
    output_db: AtomicU32,
    gain_reduction_db: AtomicU32,
}

impl Default for MeterReadings {
    fn default() -> Self {
        let floor = gain_to_decibels(0.0).to_bits();
        Self {
            input_db: AtomicU32::new(floor),
            output_db: AtomicU32::new(floor),
            gain_reduction_db: AtomicU32::new(0.0_f32.to_bits()),
        }
    }
}

impl MeterReadings {
    /// Input peak level
    pub fn input_db(&self) -> f32 {
        f32::from_bits(self.input_db.load(Ordering::Relaxed))
    }

    /// Output peak level
    pub fn output_db(&self) -> f32 {
        f32::from_bits(self.output_db.load(Ordering::Relaxed))
    }

    /// Deepest attenuation of the last processed block (0 or negative)
    pub fn gain_reduction_db(&self) -> f32 {
        f32::from_bits(self.gain_reduction_db.load(Ordering::Relaxed))
    }

    fn publish(&self, input_db: f32, output_db: f32, gain_reduction_db: f32) {
        self.input_db.store(input_db.to_bits(), Ordering::Relaxed);
        self.output_db.store(output_db.to_bits(), Ordering::Relaxed);
        self.gain_reduction_db
            .store(gain_reduction_db.to_bits(), Ordering::Relaxed);
    }
}

/// Per-block processing for the live audio callback
///
/// # Real-Time Constraints
/// After [`prepare`](Self::prepare), [`process_block`](Self::process_block)
/// does not allocate and never waits on a lock.
#[derive(Debug)]
pub struct RealtimeProcessor {
    compressors: Arc<SharedCompressors>,
    params: Arc<ParameterStore>,
    meters: Arc<MeterReadings>,
    input_level: LevelEnvelopeFollower,
    output_level: LevelEnvelopeFollower,
}

impl RealtimeProcessor {
    pub fn new(compressors: Arc<SharedCompressors>, params: Arc<ParameterStore>) -> Self {
        let mut input_level = LevelEnvelopeFollower::new();
        let mut output_level = LevelEnvelopeFollower::new();
        input_level.set_peak_decay(METER_DECAY_SECS);
        output_level.set_peak_decay(METER_DECAY_SECS);

        Self {
            compressors,
            params,
            meters: Arc::new(MeterReadings::default()),
            input_level,
            output_level,
        }
    }

    /// Prepare the shared compressors and the meters for `spec`
    pub fn prepare(&mut self, spec: ProcessSpec) {
        self.compressors.lock().prepare(spec);
        self.input_level.prepare(spec.sample_rate);
        self.output_level.prepare(spec.sample_rate);
    }

    /// Meter values, readable from any thread
    pub fn meters(&self) -> Arc<MeterReadings> {
        Arc::clone(&self.meters)
    }

    /// Process one callback block in place
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        if self.params.is_muted() {
            buffer.clear();
            return;
        }

        self.input_level.update_peak(buffer);

        let mut gain_reduction_db = 0.0;
        if let Some(mut pair) = self.compressors.try_lock() {
            let mode = self.params.detection_mode();
            pair.set_bypassed(!self.params.is_powered());

            let compressor = pair.get_mut(mode);
            compressor.set_parameters(&self.params.compressor_parameters(mode));
            compressor.process(buffer);
            if !compressor.is_bypassed() {
                gain_reduction_db = compressor.max_gain_reduction();
            }
        }

        self.output_level.update_peak(buffer);
        self.meters.publish(
            gain_to_decibels(self.input_level.peak()),
            gain_to_decibels(self.output_level.peak()),
            gain_reduction_db,
        );
    }
}
