//! The caller-facing error taxonomy.

use std::time::Duration;

use kiln_cache::CacheError;
use kiln_resolve::ResolveError;

/// Failures of a compile call itself.
///
/// A compiler rejecting the source is not one of these: it comes back as a
/// [`Response`](kiln_common::Response) with a non-empty `error`.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The request names a language the registry does not know.
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    /// The include graph could not be resolved.
    #[error(transparent)]
    IncludeRead(#[from] ResolveError),

    /// The remote service could not be reached or answered with a non-2xx
    /// status.
    #[error("transport error talking to {url}: {reason}")]
    Transport {
        /// The endpoint that failed.
        url: String,
        /// The HTTP status, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        reason: String,
    },

    /// The remote service did not answer within the configured deadline.
    #[error("request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        /// The endpoint that timed out.
        url: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// A response body or compiler output was malformed.
    #[error("decode error: {0}")]
    Decode(String),

    /// The cache failed after claiming a hit, or while being written.
    #[error(transparent)]
    CacheIo(#[from] CacheError),

    /// Staging files for, or launching, the external compiler failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A unit's script does not hash to the identity it was sent under.
    #[error("script for {identity} does not match its identity")]
    IdentityMismatch {
        /// The identity the unit claimed.
        identity: String,
    },

    /// The caller cancelled the compile.
    #[error("compile cancelled")]
    Cancelled,
}

impl CompileError {
    /// Wraps an I/O error with a description of the failed step.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
