//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// A claimed full hit that then fails to read is a hard error; the
/// dispatcher does not fall back to recompiling over a broken cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An object name cannot be used as an artifact file name.
    #[error("invalid object name '{name}'")]
    InvalidObjectName {
        /// The rejected name.
        name: String,
    },
}
