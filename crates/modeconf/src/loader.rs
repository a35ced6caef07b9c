//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ModeConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/modescope/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("modescope/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("modescope.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and layer its values over `config`.
pub fn load_from_file(config: &mut ModeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Layer the keys present in a TOML document over `config`.
///
/// Keys absent from the document keep their current value, so files loaded
/// later only need to mention what they change.
pub(crate) fn apply_toml(
    config: &mut ModeConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let type_error = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{} must be {}", key, expected),
    };

    if let Some(analysis) = table.get("analysis").and_then(|v| v.as_table()) {
        let a = &mut config.analysis;
        let floats: [(&str, &mut f64); 7] = [
            ("modal_min_confidence", &mut a.modal_min_confidence),
            ("modal_inclusion_threshold", &mut a.modal_inclusion_threshold),
            ("chromatic_min_confidence", &mut a.chromatic_min_confidence),
            ("max_confidence", &mut a.max_confidence),
            ("missing_parent_key_cap", &mut a.missing_parent_key_cap),
            ("foil_ceiling", &mut a.foil_ceiling),
            (
                "functional_prescreen_strength",
                &mut a.functional_prescreen_strength,
            ),
        ];

        for (key, slot) in floats {
            if let Some(value) = analysis.get(key) {
                // Integers are accepted so `max_confidence = 1` parses.
                *slot = value
                    .as_float()
                    .or_else(|| value.as_integer().map(|i| i as f64))
                    .ok_or_else(|| type_error(key, "a number"))?;
            }
        }

        if let Some(value) = analysis.get("max_tonic_candidates") {
            let count = value
                .as_integer()
                .filter(|&n| n >= 0)
                .ok_or_else(|| type_error("max_tonic_candidates", "a non-negative integer"))?;
            a.max_tonic_candidates = count as usize;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .ok_or_else(|| type_error("log_level", "a string"))?
                .to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
///
/// Unparseable numeric values are ignored rather than failing the load.
pub fn apply_env_overrides(config: &mut ModeConfig, sources: &mut ConfigSources) {
    let a = &mut config.analysis;
    let floats: [(&str, &mut f64); 7] = [
        ("MODESCOPE_MODAL_MIN_CONFIDENCE", &mut a.modal_min_confidence),
        ("MODESCOPE_MODAL_INCLUSION_THRESHOLD", &mut a.modal_inclusion_threshold),
        ("MODESCOPE_CHROMATIC_MIN_CONFIDENCE", &mut a.chromatic_min_confidence),
        ("MODESCOPE_MAX_CONFIDENCE", &mut a.max_confidence),
        ("MODESCOPE_MISSING_PARENT_KEY_CAP", &mut a.missing_parent_key_cap),
        ("MODESCOPE_FOIL_CEILING", &mut a.foil_ceiling),
        (
            "MODESCOPE_FUNCTIONAL_PRESCREEN_STRENGTH",
            &mut a.functional_prescreen_strength,
        ),
    ];

    for (var, slot) in floats {
        if let Ok(v) = env::var(var) {
            if let Ok(parsed) = v.trim().parse() {
                *slot = parsed;
                sources.env_overrides.push(var.to_string());
            }
        }
    }

    if let Ok(v) = env::var("MODESCOPE_MAX_TONIC_CANDIDATES") {
        if let Ok(count) = v.trim().parse() {
            a.max_tonic_candidates = count;
            sources
                .env_overrides
                .push("MODESCOPE_MAX_TONIC_CANDIDATES".to_string());
        }
    }

    if let Ok(v) = env::var("MODESCOPE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("MODESCOPE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}
