//! Analysis configuration
//!
//! Settings shared by both processing strategies. Batch tuning for the async
//! strategy lives in [`crate::strategy::BatchConfig`].

use rust_decimal::Decimal;

/// Default severity marker lines must contain
pub const DEFAULT_SEVERITY_MARKER: &str = "INFO";

/// Default extension of compressed log files
pub const DEFAULT_FILE_EXTENSION: &str = "gz";

/// Default file name prefix for output tables
pub const DEFAULT_OUTPUT_PREFIX: &str = "log_analysis";

/// Configuration for a single analysis run
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    /// Only lines containing this marker are analyzed
    pub severity_marker: String,

    /// Extension (without dot) of the compressed log files to read
    pub file_extension: String,

    /// Balances in `[0, at_risk_threshold)` are flagged as at risk
    pub at_risk_threshold: Decimal,

    /// Prefix for every output table file name
    pub output_prefix: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            severity_marker: DEFAULT_SEVERITY_MARKER.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            at_risk_threshold: Decimal::TEN,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a config with custom values
    ///
    /// Empty strings and a non-positive threshold fall back to the defaults
    /// with a warning.
    pub fn new(
        severity_marker: &str,
        file_extension: &str,
        at_risk_threshold: Decimal,
        output_prefix: &str,
    ) -> Self {
        let default = Self::default();

        let severity_marker = if severity_marker.trim().is_empty() {
            log::warn!(
                "Invalid severity marker ('{}'), using default ({})",
                severity_marker,
                default.severity_marker
            );
            default.severity_marker
        } else {
            severity_marker.trim().to_string()
        };

        let file_extension = match file_extension.trim().trim_start_matches('.') {
            "" => {
                log::warn!(
                    "Invalid file extension ('{}'), using default ({})",
                    file_extension,
                    default.file_extension
                );
                default.file_extension
            }
            extension => extension.to_string(),
        };

        let at_risk_threshold = if at_risk_threshold <= Decimal::ZERO {
            log::warn!(
                "Invalid at-risk threshold ({}), using default ({})",
                at_risk_threshold,
                default.at_risk_threshold
            );
            default.at_risk_threshold
        } else {
            at_risk_threshold
        };

        let output_prefix = if output_prefix.trim().is_empty() {
            log::warn!(
                "Invalid output prefix ('{}'), using default ({})",
                output_prefix,
                default.output_prefix
            );
            default.output_prefix
        } else {
            output_prefix.trim().to_string()
        };

        Self {
            severity_marker,
            file_extension,
            at_risk_threshold,
            output_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.severity_marker, "INFO");
        assert_eq!(config.file_extension, "gz");
        assert_eq!(config.at_risk_threshold, Decimal::new(10, 0));
        assert_eq!(config.output_prefix, "log_analysis");
    }

    #[rstest]
    #[case::custom("WARN", "log.gz", Decimal::new(25, 0), "run1", "WARN", "log.gz", Decimal::new(25, 0), "run1")]
    #[case::dotted_extension("INFO", ".gz", Decimal::TEN, "p", "INFO", "gz", Decimal::TEN, "p")]
    #[case::empty_marker("  ", "gz", Decimal::TEN, "p", "INFO", "gz", Decimal::TEN, "p")]
    #[case::empty_extension("INFO", ".", Decimal::TEN, "p", "INFO", "gz", Decimal::TEN, "p")]
    #[case::zero_threshold("INFO", "gz", Decimal::ZERO, "p", "INFO", "gz", Decimal::TEN, "p")]
    #[case::empty_prefix("INFO", "gz", Decimal::TEN, "", "INFO", "gz", Decimal::TEN, "log_analysis")]
    #[allow(clippy::too_many_arguments)]
    fn test_new_with_fallbacks(
        #[case] marker: &str,
        #[case] extension: &str,
        #[case] threshold: Decimal,
        #[case] prefix: &str,
        #[case] expected_marker: &str,
        #[case] expected_extension: &str,
        #[case] expected_threshold: Decimal,
        #[case] expected_prefix: &str,
    ) {
        let config = AnalyzerConfig::new(marker, extension, threshold, prefix);
        assert_eq!(config.severity_marker, expected_marker);
        assert_eq!(config.file_extension, expected_extension);
        assert_eq!(config.at_risk_threshold, expected_threshold);
        assert_eq!(config.output_prefix, expected_prefix);
    }
}
