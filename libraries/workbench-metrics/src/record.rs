//! Metric records for the three signal roles

use crate::reference::ReferenceLoudness;
use serde::Serialize;
use std::fmt;

/// Which signal a metrics record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRole {
    /// The loaded file as-is
    Uncompressed,
    /// Output of the peak-detecting compressor
    PeakCompressed,
    /// Output of the RMS-detecting compressor
    RmsCompressed,
}

impl SignalRole {
    /// All roles in report order
    pub const ALL: [Self; 3] = [Self::Uncompressed, Self::PeakCompressed, Self::RmsCompressed];

    /// Human readable name used as the report block header
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Uncompressed => "Uncompressed signal",
            Self::PeakCompressed => "Peak compressed signal",
            Self::RmsCompressed => "RMS compressed signal",
        }
    }

    /// True for the two compressed roles
    pub fn is_compressed(self) -> bool {
        !matches!(self, Self::Uncompressed)
    }
}

impl fmt::Display for SignalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Descriptors computed identically for every role
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SignalMetrics {
    /// Largest absolute sample value (linear)
    pub peak: f64,
    /// Silence-gated mean of squared samples
    pub mean_energy: f64,
    /// Square root of `mean_energy`
    pub rms: f64,
    /// Peak to RMS ratio in dB
    pub crest_factor_db: f64,
    /// Integrated loudness of the K-weighted signal
    pub lufs: f64,
    /// Loudness range in LU
    pub lra: f64,
}

/// How a compressed signal differs from the uncompressed one
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImpactMetrics {
    /// Uncompressed crest factor minus compressed crest factor (dB)
    pub crest_reduction_db: f64,
    /// Uncompressed LRA minus compressed LRA (LU)
    pub lra_reduction: f64,
    /// Positive when transients got flatter, in [-1, 1]
    pub transient_impact: f64,
    /// Share of transient-window energy that survived, at most 1
    pub transient_energy_preservation: f64,
    /// RMS of the difference signal relative to the uncompressed RMS
    pub harmonic_distortion: f64,
    /// Root mean square error over all samples
    pub rmse: f64,
    /// Pearson correlation over all samples
    pub correlation: f64,
}

/// Statistics of a linear gain-reduction signal, as positive dB magnitudes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GainReductionStats {
    /// Mean reduction over non-silent samples
    pub average_db: f64,
    /// Deepest reduction
    pub max_db: f64,
    /// Standard deviation around `average_db`
    pub std_dev_db: f64,
    /// dB of the mean squared linear gain
    pub energy_db: f64,
    /// Mean absolute change per second
    pub rate_of_change_db_per_sec: f64,
    /// Fraction of non-floor samples with any reduction applied
    pub activity_ratio: f64,
    /// Peak to RMS ratio of the linear gain in dB
    pub crest_factor_db: f64,
}

/// Complete record for one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionMetrics {
    /// Role this record describes
    pub role: SignalRole,
    /// Per-signal descriptors
    pub signal: SignalMetrics,
    /// EBU R128 cross-check of `signal.lufs` and `signal.lra`
    pub reference: ReferenceLoudness,
    /// Comparison against the uncompressed role, compressed roles only
    pub impact: Option<ImpactMetrics>,
    /// Gain-reduction statistics, compressed roles only
    pub gain_reduction: Option<GainReductionStats>,
}

impl CompressionMetrics {
    /// Zeroed record for `role`
    pub fn empty(role: SignalRole) -> Self {
        Self {
            role,
            signal: SignalMetrics::default(),
            reference: ReferenceLoudness::default(),
            impact: role.is_compressed().then(ImpactMetrics::default),
            gain_reduction: role.is_compressed().then(GainReductionStats::default),
        }
    }

    /// Render the record as a labelled text block
    pub fn format_metrics(&self) -> String {
        self.to_string()
    }
}

fn write_optional(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: Option<f64>,
    unit: &str,
) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "{label}: {v:.2} {unit}"),
        None => writeln!(f, "{label}: n/a"),
    }
}

impl fmt::Display for CompressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.signal;
        writeln!(f, "--- {} ---", self.role)?;
        writeln!(f, "Peak: {:.4}", s.peak)?;
        writeln!(f, "Mean energy: {:.6}", s.mean_energy)?;
        writeln!(f, "RMS: {:.4}", s.rms)?;
        writeln!(f, "Crest factor: {:.2} dB", s.crest_factor_db)?;
        writeln!(f, "Integrated loudness: {:.2} LUFS", s.lufs)?;
        writeln!(f, "Loudness range: {:.2} LU", s.lra)?;
        write_optional(
            f,
            "Reference integrated loudness (EBU R128)",
            self.reference.integrated_lufs,
            "LUFS",
        )?;
        write_optional(
            f,
            "Reference loudness range (EBU R128)",
            self.reference.loudness_range_lu,
            "LU",
        )?;

        if let Some(impact) = &self.impact {
            writeln!(
                f,
                "Dynamic range reduction (crest factor): {:.2} dB",
                impact.crest_reduction_db
            )?;
            writeln!(f, "Dynamic range reduction (LRA): {:.2} LU", impact.lra_reduction)?;
            writeln!(f, "Transient impact: {:.4}", impact.transient_impact)?;
            writeln!(
                f,
                "Transient energy preservation: {:.4}",
                impact.transient_energy_preservation
            )?;
            writeln!(f, "Harmonic distortion: {:.4}", impact.harmonic_distortion)?;
            writeln!(f, "RMSE: {:.6}", impact.rmse)?;
            writeln!(f, "Correlation: {:.4}", impact.correlation)?;
        }

        if let Some(gr) = &self.gain_reduction {
            writeln!(f, "Average gain reduction: {:.2} dB", gr.average_db)?;
            writeln!(f, "Max gain reduction: {:.2} dB", gr.max_db)?;
            writeln!(f, "Gain reduction standard deviation: {:.2} dB", gr.std_dev_db)?;
            writeln!(f, "Gain reduction energy: {:.2} dB", gr.energy_db)?;
            writeln!(
                f,
                "Gain reduction rate of change: {:.2} dB/s",
                gr.rate_of_change_db_per_sec
            )?;
            writeln!(f, "Compression activity ratio: {:.4}", gr.activity_ratio)?;
            writeln!(f, "Gain reduction crest factor: {:.2} dB", gr.crest_factor_db)?;
        }

        writeln!(f)
    }
}
