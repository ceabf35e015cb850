//! The language registry: one flat table entry per supported contract language.
//!
//! Each entry knows where its cache lives, how to find include statements and
//! declared objects in source, how to build the external compiler's command
//! line, and how to decode that compiler's output into response items.

#![warn(missing_docs)]

pub mod decode;
pub mod error;
pub mod language;
pub mod registry;

pub use decode::OutputFormat;
pub use error::LanguageError;
pub use language::{object_name_for_script, IncludeMatch, LanguageConfig, ARGS_PLACEHOLDER};
pub use registry::Registry;
