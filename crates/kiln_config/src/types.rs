//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default deadline for a remote compile request, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// The top-level configuration parsed from `kiln.toml`.
///
/// Every table is optional; an empty file yields the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct KilnConfig {
    /// Where compiled artifacts are cached.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Default remote compile service settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Per-language overrides keyed by registry key (`sol`, `se`, `lll`).
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageOverride>,
}

/// Cache location settings.
#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    /// Cache root; each language caches under `<root>/<key>`.
    pub root: Option<PathBuf>,
}

/// Remote compile service settings.
#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    /// Endpoint used by every language without its own `url`.
    pub url: Option<String>,
    /// Request deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Overrides for a single language entry.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageOverride {
    /// Path or name of the compiler binary.
    pub compiler: Option<String>,
    /// Remote endpoint for this language only.
    pub url: Option<String>,
    /// Always compile this language locally, ignoring any remote URL.
    #[serde(default)]
    pub local: bool,
    /// Replacement list of file extensions.
    #[serde(default)]
    pub extensions: Vec<String>,
}
