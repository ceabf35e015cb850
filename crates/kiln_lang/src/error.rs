//! Error types for language lookup and compiler output decoding.

/// Errors raised by the language registry and output decoders.
#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    /// No registry entry matches the given key or file extension.
    #[error("unknown language '{0}'")]
    Unknown(String),

    /// A configured include or object pattern is not a valid regex.
    #[error("invalid pattern for language '{language}': {source}")]
    InvalidPattern {
        /// The language key the pattern belongs to.
        language: String,
        /// The regex compilation error.
        source: regex::Error,
    },

    /// The external compiler's output could not be decoded.
    #[error("malformed {language} compiler output: {reason}")]
    Decode {
        /// The language key whose decoder failed.
        language: String,
        /// Description of what was wrong with the output.
        reason: String,
    },
}
