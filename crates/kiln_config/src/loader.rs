//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KilnConfig;
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<KilnConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Walks up from `start` looking for the nearest `kiln.toml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Validates values that parse but make no sense.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    if config.remote.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "remote.timeout_secs must be greater than zero".to_string(),
        ));
    }
    for (key, lang) in &config.languages {
        if lang.compiler.as_deref() == Some("") {
            return Err(ConfigError::ValidationError(format!(
                "languages.{key}.compiler must not be empty"
            )));
        }
        if lang.extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err(ConfigError::ValidationError(format!(
                "languages.{key}.extensions entries must be non-empty and without a leading dot"
            )));
        }
    }
    Ok(())
}
