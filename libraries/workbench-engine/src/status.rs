//! Run state shared between the extraction worker and observers
//!
//! Everything here is lock-free so a UI thread can poll progress while a
//! run is in flight.

use crate::error::{EngineError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Stage of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Loading,
    Compressing,
    ComputingMetrics,
    Exporting,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Compressing,
            3 => Self::ComputingMetrics,
            4 => Self::Exporting,
            _ => Self::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Loading => 1,
            Self::Compressing => 2,
            Self::ComputingMetrics => 3,
            Self::Exporting => 4,
        }
    }

    /// Progress value reported when this stage starts
    pub fn progress(self) -> f64 {
        match self {
            Self::Idle | Self::Loading => 0.0,
            Self::Compressing => 0.3,
            Self::ComputingMetrics => 0.6,
            Self::Exporting => 0.8,
        }
    }
}

/// How the most recent run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No run has finished yet
    None,
    Succeeded,
    Failed,
}

impl RunOutcome {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Succeeded,
            2 => Self::Failed,
            _ => Self::None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Succeeded => 1,
            Self::Failed => 2,
        }
    }
}

/// Processing flag, progress, stage, and last outcome
#[derive(Debug)]
pub struct EngineStatus {
    processing: AtomicBool,
    /// f64 bits
    progress: AtomicU64,
    state: AtomicU8,
    outcome: AtomicU8,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            processing: AtomicBool::new(false),
            progress: AtomicU64::new(0.0_f64.to_bits()),
            state: AtomicU8::new(EngineState::Idle.as_u8()),
            outcome: AtomicU8::new(RunOutcome::None.as_u8()),
        }
    }
}

impl EngineStatus {
    /// Create an idle status
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True from the start of a run until it finishes or fails
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Progress in `0.0..=1.0`, monotonic within a run
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Current stage
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Outcome of the last finished run
    pub fn last_outcome(&self) -> RunOutcome {
        RunOutcome::from_u8(self.outcome.load(Ordering::Acquire))
    }

    pub(crate) fn set_progress(&self, progress: f64) {
        self.progress.store(progress.to_bits(), Ordering::Release);
    }

    pub(crate) fn enter(&self, state: EngineState) {
        self.state.store(state.as_u8(), Ordering::Release);
        self.set_progress(state.progress());
    }

    /// Claim the status for a new run
    ///
    /// The returned guard puts the status back to idle when dropped and
    /// records a failure unless [`RunGuard::succeed`] was called.
    pub(crate) fn try_begin(self: &Arc<Self>) -> Result<RunGuard> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::AlreadyProcessing)?;
        self.enter(EngineState::Loading);
        Ok(RunGuard {
            status: Arc::clone(self),
            succeeded: false,
        })
    }
}

/// Marks the status busy for the lifetime of one run
#[derive(Debug)]
pub(crate) struct RunGuard {
    status: Arc<EngineStatus>,
    succeeded: bool,
}

impl RunGuard {
    pub(crate) fn status(&self) -> &EngineStatus {
        &self.status
    }

    pub(crate) fn succeed(mut self) {
        self.status.set_progress(1.0);
        self.succeeded = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let outcome = if self.succeeded {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        };
        self.status.outcome.store(outcome.as_u8(), Ordering::Release);
        self.status
            .state
            .store(EngineState::Idle.as_u8(), Ordering::Release);
        self.status.processing.store(false, Ordering::Release);
    }
}
