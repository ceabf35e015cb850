//! Applying a loaded configuration onto the language registry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kiln_lang::Registry;

use crate::error::ConfigError;
use crate::types::KilnConfig;

/// Environment variable overriding the kiln home directory.
pub const KILN_HOME_ENV: &str = "KILN_HOME";

impl KilnConfig {
    /// Returns the cache root: the configured one, else `$KILN_HOME/cache`,
    /// else `$HOME/.kiln/cache`, else `.kiln/cache`.
    pub fn cache_root(&self) -> PathBuf {
        if let Some(root) = &self.cache.root {
            return root.clone();
        }
        if let Some(home) = std::env::var_os(KILN_HOME_ENV) {
            return PathBuf::from(home).join("cache");
        }
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join(".kiln"))
            .unwrap_or_else(|| PathBuf::from(".kiln"))
            .join("cache")
    }

    /// Returns the remote request deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    /// Builds the default registry rooted at [`cache_root`](Self::cache_root)
    /// and applies this configuration's overrides to it.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::with_defaults(&self.cache_root())?;
        self.apply(&mut registry)?;
        Ok(registry)
    }

    /// Applies overrides onto an existing registry.
    ///
    /// A language's remote URL is its own `url`, else the global
    /// `remote.url`; `local = true` clears it.
    pub fn apply(&self, registry: &mut Registry) -> Result<(), ConfigError> {
        for key in self.languages.keys() {
            if registry.get(key).is_err() {
                return Err(ConfigError::UnknownLanguage(key.clone()));
            }
        }

        for lang in registry.iter_mut() {
            let overrides = self.languages.get(&lang.key);

            if let Some(compiler) = overrides.and_then(|o| o.compiler.as_deref()) {
                lang.set_compiler(compiler);
            }
            if let Some(exts) = overrides.map(|o| &o.extensions).filter(|e| !e.is_empty()) {
                lang.extensions = exts.clone();
            }

            let local = overrides.is_some_and(|o| o.local);
            let url = overrides
                .and_then(|o| o.url.clone())
                .or_else(|| self.remote.url.clone());
            lang.remote_url = if local { None } else { url };
        }
        Ok(())
    }
}

/// Points every language's cache directory at `<root>/<key>`.
pub fn set_cache_root(registry: &mut Registry, root: &Path) {
    for lang in registry.iter_mut() {
        lang.cache_dir = root.join(&lang.key);
    }
}
