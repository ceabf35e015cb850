//! Parsing and validation of `kiln.toml` configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`KilnConfig`], which is then applied onto an explicitly constructed
//! language [`Registry`](kiln_lang::Registry).

#![warn(missing_docs)]

pub mod apply;
pub mod error;
pub mod loader;
pub mod types;

pub use apply::{set_cache_root, KILN_HOME_ENV};
pub use error::ConfigError;
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
