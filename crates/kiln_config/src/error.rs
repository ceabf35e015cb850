//! Error types for configuration loading and validation.

use kiln_lang::LanguageError;

/// Errors that can occur when loading or applying a `kiln.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read kiln.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A `[languages.<key>]` table names a language the registry lacks.
    #[error("unknown language '{0}' in configuration")]
    UnknownLanguage(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The built-in language table could not be constructed.
    #[error(transparent)]
    Registry(#[from] LanguageError),
}
