//! Error types for include resolution.

use std::path::PathBuf;

/// Errors that abort resolution of an include graph.
///
/// Any of these fails the whole request: a file whose include graph is
/// broken is never partially compiled.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The top-level source file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadSource {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An included file could not be found or read.
    #[error("failed to read include file {path} (included from {included_from}): {source}")]
    IncludeRead {
        /// The resolved path of the included file.
        path: PathBuf,
        /// The file containing the include statement.
        included_from: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An include statement matched but its target is unusable.
    #[error("malformed include statement `{statement}` in {included_from}")]
    Malformed {
        /// The statement text as written.
        statement: String,
        /// The file containing the statement.
        included_from: PathBuf,
    },

    /// A file transitively includes itself.
    #[error("include cycle: {}", format_chain(.chain))]
    Cycle {
        /// The include chain, ending with the file that closes the cycle.
        chain: Vec<PathBuf>,
    },

    /// The caller cancelled the resolution.
    #[error("include resolution cancelled")]
    Cancelled,
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
