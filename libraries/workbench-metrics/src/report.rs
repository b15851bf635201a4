//! Plain-text metrics report

use crate::record::CompressionMetrics;
use workbench_core::{CompressorParameters, DetectionMode};

/// Parameter block printed ahead of each compressed role
pub fn format_parameter_block(mode: DetectionMode, parameters: &CompressorParameters) -> String {
    format!(
        "Compression parameter values for {} detection:\n{}\n",
        mode.label(),
        parameters
    )
}

/// Assemble the full report
///
/// Sections appear in the fixed order uncompressed, peak parameters, peak,
/// RMS parameters, RMS.
pub fn build_report(
    file_name: &str,
    uncompressed: &CompressionMetrics,
    peak: (&CompressorParameters, &CompressionMetrics),
    rms: (&CompressorParameters, &CompressionMetrics),
) -> String {
    let mut text = format!("Metrics Summary for: {file_name}\n\n");
    text.push_str(&uncompressed.format_metrics());
    text.push_str(&format_parameter_block(DetectionMode::Peak, peak.0));
    text.push_str(&peak.1.format_metrics());
    text.push_str(&format_parameter_block(DetectionMode::Rms, rms.0));
    text.push_str(&rms.1.format_metrics());
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SignalRole;

    #[test]
    fn sections_follow_the_fixed_order() {
        let peak_params = CompressorParameters {
            threshold_db: -12.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack_ms: 5.0,
            release_ms: 100.0,
            makeup_db: 0.0,
        };
        let rms_params = CompressorParameters::default();

        let report = build_report(
            "tone.wav",
            &CompressionMetrics::empty(SignalRole::Uncompressed),
            (&peak_params, &CompressionMetrics::empty(SignalRole::PeakCompressed)),
            (&rms_params, &CompressionMetrics::empty(SignalRole::RmsCompressed)),
        );

        assert!(report.starts_with("Metrics Summary for: tone.wav\n\n--- Uncompressed signal ---\n"));
        assert!(report.contains(
            "Compression parameter values for peak detection:\n\
             Threshold: -12, Ratio: 4, Knee: 0, Attack: 5, Release: 100, Makeup Gain: 0.\n"
        ));

        let positions: Vec<usize> = [
            "--- Uncompressed signal ---",
            "Compression parameter values for peak detection:",
            "--- Peak compressed signal ---",
            "Compression parameter values for rms detection:",
            "--- RMS compressed signal ---",
        ]
        .iter()
        .map(|needle| report.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
