//! The metrics calculator
//!
//! Holds one record per signal role. `extract_metrics` validates the five
//! input buffers, computes the uncompressed record first, then both
//! compressed records against it.

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use crate::gain_reduction::gain_reduction_stats;
use crate::impact::impact_metrics;
use crate::record::{CompressionMetrics, SignalMetrics, SignalRole};
use crate::reference::{measure_reference, ReferenceLoudness};
use crate::signal::signal_metrics;
use tracing::{debug, warn};
use workbench_core::AudioBuffer;

/// The five buffers a metrics extraction needs
///
/// Build with [`MetricsInput::new`] and the `with_*` methods; anything left
/// out is reported as [`MetricsError::MissingSignal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsInput<'a> {
    uncompressed: Option<&'a AudioBuffer>,
    peak_compressed: Option<&'a AudioBuffer>,
    peak_gain_reduction: Option<&'a AudioBuffer>,
    rms_compressed: Option<&'a AudioBuffer>,
    rms_gain_reduction: Option<&'a AudioBuffer>,
}

impl<'a> MetricsInput<'a> {
    /// Start from the uncompressed signal
    pub fn new(uncompressed: &'a AudioBuffer) -> Self {
        Self {
            uncompressed: Some(uncompressed),
            ..Self::default()
        }
    }

    /// Peak-compressed audio and its gain-reduction signal
    #[must_use]
    pub fn with_peak(mut self, compressed: &'a AudioBuffer, gain_reduction: &'a AudioBuffer) -> Self {
        self.peak_compressed = Some(compressed);
        self.peak_gain_reduction = Some(gain_reduction);
        self
    }

    /// RMS-compressed audio and its gain-reduction signal
    #[must_use]
    pub fn with_rms(mut self, compressed: &'a AudioBuffer, gain_reduction: &'a AudioBuffer) -> Self {
        self.rms_compressed = Some(compressed);
        self.rms_gain_reduction = Some(gain_reduction);
        self
    }
}

/// Buffers after presence and shape checks
struct ValidatedInput<'a> {
    uncompressed: &'a AudioBuffer,
    peak: (&'a AudioBuffer, &'a AudioBuffer),
    rms: (&'a AudioBuffer, &'a AudioBuffer),
}

fn require<'a>(buffer: Option<&'a AudioBuffer>, role: SignalRole) -> Result<&'a AudioBuffer> {
    let buffer = buffer.ok_or(MetricsError::MissingSignal(role))?;
    if buffer.is_empty() || buffer.num_channels() == 0 {
        return Err(MetricsError::EmptySignal(role));
    }
    Ok(buffer)
}

fn check_shape(what: &'static str, reference: &AudioBuffer, buffer: &AudioBuffer) -> Result<()> {
    if reference.same_shape(buffer) {
        Ok(())
    } else {
        Err(MetricsError::ShapeMismatch {
            what,
            expected_channels: reference.num_channels(),
            expected_samples: reference.num_samples(),
            found_channels: buffer.num_channels(),
            found_samples: buffer.num_samples(),
        })
    }
}

impl<'a> MetricsInput<'a> {
    fn validate(&self) -> Result<ValidatedInput<'a>> {
        let uncompressed = require(self.uncompressed, SignalRole::Uncompressed)?;
        let peak = require(self.peak_compressed, SignalRole::PeakCompressed)?;
        let peak_gr = require(self.peak_gain_reduction, SignalRole::PeakCompressed)?;
        let rms = require(self.rms_compressed, SignalRole::RmsCompressed)?;
        let rms_gr = require(self.rms_gain_reduction, SignalRole::RmsCompressed)?;

        check_shape("Peak compressed signal", uncompressed, peak)?;
        check_shape("Peak gain reduction signal", uncompressed, peak_gr)?;
        check_shape("RMS compressed signal", uncompressed, rms)?;
        check_shape("RMS gain reduction signal", uncompressed, rms_gr)?;

        Ok(ValidatedInput {
            uncompressed,
            peak: (peak, peak_gr),
            rms: (rms, rms_gr),
        })
    }
}

/// Computes and keeps the metrics of the last successful extraction
#[derive(Debug, Clone)]
pub struct Metrics {
    config: MetricsConfig,
    sample_rate: f64,
    uncompressed: CompressionMetrics,
    peak: CompressionMetrics,
    rms: CompressionMetrics,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl Metrics {
    /// Create a calculator; call [`prepare`](Self::prepare) before extracting
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            sample_rate: 0.0,
            uncompressed: CompressionMetrics::empty(SignalRole::Uncompressed),
            peak: CompressionMetrics::empty(SignalRole::PeakCompressed),
            rms: CompressionMetrics::empty(SignalRole::RmsCompressed),
        }
    }

    /// Set the sample rate of the signals to analyse
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Sample rate given to the last `prepare`
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Active configuration
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute all three records from `input`
    ///
    /// # Errors
    /// Fails without touching the stored records when a buffer is missing,
    /// empty, or shaped differently from the uncompressed signal, or when
    /// no valid sample rate was prepared.
    pub fn extract_metrics(&mut self, input: &MetricsInput<'_>) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(MetricsError::InvalidSampleRate(self.sample_rate));
        }

        let input = match input.validate() {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Rejecting metrics input");
                return Err(e);
            }
        };

        let uncompressed_signal = signal_metrics(input.uncompressed, self.sample_rate, &self.config);
        let uncompressed = CompressionMetrics {
            role: SignalRole::Uncompressed,
            signal: uncompressed_signal,
            reference: self.reference(input.uncompressed, SignalRole::Uncompressed),
            impact: None,
            gain_reduction: None,
        };

        let peak = self.compressed_record(
            SignalRole::PeakCompressed,
            input.uncompressed,
            &uncompressed_signal,
            input.peak,
        );
        let rms = self.compressed_record(
            SignalRole::RmsCompressed,
            input.uncompressed,
            &uncompressed_signal,
            input.rms,
        );

        debug!(
            sample_rate = self.sample_rate,
            samples = input.uncompressed.num_samples(),
            channels = input.uncompressed.num_channels(),
            "Extracted metrics"
        );

        self.uncompressed = uncompressed;
        self.peak = peak;
        self.rms = rms;
        Ok(())
    }

    fn compressed_record(
        &self,
        role: SignalRole,
        uncompressed: &AudioBuffer,
        uncompressed_signal: &SignalMetrics,
        (compressed, gain_reduction): (&AudioBuffer, &AudioBuffer),
    ) -> CompressionMetrics {
        let signal = signal_metrics(compressed, self.sample_rate, &self.config);
        CompressionMetrics {
            role,
            signal,
            reference: self.reference(compressed, role),
            impact: Some(impact_metrics(
                uncompressed,
                uncompressed_signal,
                compressed,
                &signal,
                self.sample_rate,
                &self.config,
            )),
            gain_reduction: Some(gain_reduction_stats(gain_reduction, self.sample_rate)),
        }
    }

    fn reference(&self, buffer: &AudioBuffer, role: SignalRole) -> ReferenceLoudness {
        measure_reference(buffer, self.sample_rate).unwrap_or_else(|e| {
            warn!(role = %role, error = %e, "EBU R128 reference measurement unavailable");
            ReferenceLoudness::default()
        })
    }

    /// Record of the uncompressed signal
    pub fn uncompressed_metrics(&self) -> &CompressionMetrics {
        &self.uncompressed
    }

    /// Record of the peak-compressed signal
    pub fn peak_metrics(&self) -> &CompressionMetrics {
        &self.peak
    }

    /// Record of the RMS-compressed signal
    pub fn rms_metrics(&self) -> &CompressionMetrics {
        &self.rms
    }

    /// Record for `role`
    pub fn metrics_for(&self, role: SignalRole) -> &CompressionMetrics {
        match role {
            SignalRole::Uncompressed => &self.uncompressed,
            SignalRole::PeakCompressed => &self.peak,
            SignalRole::RmsCompressed => &self.rms,
        }
    }
}
