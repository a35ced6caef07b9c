//! Analysis tunables and telemetry settings.

use serde::{Deserialize, Serialize};

/// Thresholds and ceilings used by the harmonic analyzers.
///
/// Every field defaults to the value the engine was calibrated with; the
/// config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum confidence for the modal analyzer to report a finding.
    /// Default: 0.5
    #[serde(default = "AnalysisConfig::default_modal_min_confidence")]
    pub modal_min_confidence: f64,

    /// Minimum modal confidence for the comprehensive result to include it.
    /// Default: 0.7
    #[serde(default = "AnalysisConfig::default_modal_inclusion_threshold")]
    pub modal_inclusion_threshold: f64,

    /// Minimum chromatic confidence for the comprehensive result to include it.
    /// Default: 0.5
    #[serde(default = "AnalysisConfig::default_chromatic_min_confidence")]
    pub chromatic_min_confidence: f64,

    /// Hard ceiling on every reported confidence.
    /// Default: 0.95
    #[serde(default = "AnalysisConfig::default_max_confidence")]
    pub max_confidence: f64,

    /// Cap applied when the caller supplied no parent key.
    /// Default: 0.65
    #[serde(default = "AnalysisConfig::default_missing_parent_key_cap")]
    pub missing_parent_key_cap: f64,

    /// Ceiling forced onto candidates whose progression matches a foil.
    /// Default: 0.3
    #[serde(default = "AnalysisConfig::default_foil_ceiling")]
    pub foil_ceiling: f64,

    /// Functional patterns above this strength reject a modal reading.
    /// Default: 0.8
    #[serde(default = "AnalysisConfig::default_functional_prescreen_strength")]
    pub functional_prescreen_strength: f64,

    /// Number of vote winners the tonic resolver keeps (the parent key root
    /// is proposed on top of these).
    /// Default: 2
    #[serde(default = "AnalysisConfig::default_max_tonic_candidates")]
    pub max_tonic_candidates: usize,
}

impl AnalysisConfig {
    fn default_modal_min_confidence() -> f64 {
        0.5
    }

    fn default_modal_inclusion_threshold() -> f64 {
        0.7
    }

    fn default_chromatic_min_confidence() -> f64 {
        0.5
    }

    fn default_max_confidence() -> f64 {
        0.95
    }

    fn default_missing_parent_key_cap() -> f64 {
        0.65
    }

    fn default_foil_ceiling() -> f64 {
        0.3
    }

    fn default_functional_prescreen_strength() -> f64 {
        0.8
    }

    fn default_max_tonic_candidates() -> usize {
        2
    }

    /// Check that every threshold is a usable probability.
    ///
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        let bounded = [
            ("modal_min_confidence", self.modal_min_confidence),
            ("modal_inclusion_threshold", self.modal_inclusion_threshold),
            ("chromatic_min_confidence", self.chromatic_min_confidence),
            ("max_confidence", self.max_confidence),
            ("missing_parent_key_cap", self.missing_parent_key_cap),
            ("foil_ceiling", self.foil_ceiling),
            (
                "functional_prescreen_strength",
                self.functional_prescreen_strength,
            ),
        ];

        for (name, value) in bounded {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        if self.max_tonic_candidates == 0 {
            return Err("max_tonic_candidates must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            modal_min_confidence: Self::default_modal_min_confidence(),
            modal_inclusion_threshold: Self::default_modal_inclusion_threshold(),
            chromatic_min_confidence: Self::default_chromatic_min_confidence(),
            max_confidence: Self::default_max_confidence(),
            missing_parent_key_cap: Self::default_missing_parent_key_cap(),
            foil_ceiling: Self::default_foil_ceiling(),
            functional_prescreen_strength: Self::default_functional_prescreen_strength(),
            max_tonic_candidates: Self::default_max_tonic_candidates(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let config = AnalysisConfig {
            foil_ceiling: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("foil_ceiling"), "unexpected message: {}", err);
    }

    #[test]
    fn zero_candidates_rejected() {
        let config = AnalysisConfig {
            max_tonic_candidates: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
