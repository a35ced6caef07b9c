//! Configuration loading for modescope.
//!
//! The analysis engine is pure and needs nothing but a handful of
//! thresholds; this crate finds them. Compiled defaults are the calibrated
//! values, so running with no config file at all is the normal case.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/modescope/config.toml` (system)
//! 2. `~/.config/modescope/config.toml` (user)
//! 3. `./modescope.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`MODESCOPE_*`, plus `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! modal_inclusion_threshold = 0.7
//! missing_parent_key_cap = 0.65
//! foil_ceiling = 0.3
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod analysis;
pub mod loader;

pub use analysis::{AnalysisConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete modescope configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModeConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ModeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./modescope.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "config file does not exist",
                    ),
                });
            }
        }

        let mut sources = ConfigSources::default();
        let mut config = ModeConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        config.analysis.validate().map_err(ConfigError::Invalid)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let a = &self.analysis;
        let mut output = String::new();

        output.push_str("# modescope configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("modal_min_confidence = {:?}\n", a.modal_min_confidence));
        output.push_str(&format!(
            "modal_inclusion_threshold = {:?}\n",
            a.modal_inclusion_threshold
        ));
        output.push_str(&format!(
            "chromatic_min_confidence = {:?}\n",
            a.chromatic_min_confidence
        ));
        output.push_str(&format!("max_confidence = {:?}\n", a.max_confidence));
        output.push_str(&format!(
            "missing_parent_key_cap = {:?}\n",
            a.missing_parent_key_cap
        ));
        output.push_str(&format!("foil_ceiling = {:?}\n", a.foil_ceiling));
        output.push_str(&format!(
            "functional_prescreen_strength = {:?}\n",
            a.functional_prescreen_strength
        ));
        output.push_str(&format!("max_tonic_candidates = {}\n", a.max_tonic_candidates));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config() {
        let config = ModeConfig::default();
        assert_eq!(config.analysis.max_confidence, 0.95);
        assert_eq!(config.analysis.max_tonic_candidates, 2);
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_to_toml_roundtrips_through_loader() {
        let mut original = ModeConfig::default();
        original.analysis.foil_ceiling = 0.2;
        original.telemetry.log_level = "debug".into();

        let rendered = original.to_toml();
        assert!(rendered.contains("[analysis]"));
        assert!(rendered.contains("[telemetry]"));

        let mut reloaded = ModeConfig::default();
        loader::apply_toml(&mut reloaded, &rendered, Path::new("rendered.toml")).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let err = ModeConfig::load_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("modescope.toml");
        std::fs::write(&path, "[analysis]\nmax_confidence = 2.0\n").unwrap();

        let err = ModeConfig::load_from(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
