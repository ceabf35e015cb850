//! The language table and its built-in entries.

use std::path::Path;

use crate::decode::OutputFormat;
use crate::error::LanguageError;
use crate::language::{LanguageConfig, ARGS_PLACEHOLDER};

/// Registry key for LLL.
pub const LLL: &str = "lll";
/// Registry key for Serpent.
pub const SERPENT: &str = "se";
/// Registry key for Solidity.
pub const SOLIDITY: &str = "sol";

const LLL_INCLUDE: &str = r#"\(include\s+"(?P<path>[^"]+)"\s*\)"#;
const SERPENT_INCLUDE: &str = r#"\bcreate\(\s*(?P<quote>["'])(?P<path>[^"']+)["']\s*\)"#;
const SOLIDITY_INCLUDE: &str = r#"\bimport\s+(?:[^;"']*\s)?(?P<quote>["'])(?P<path>[^"']+)["'](?:\s+as\s+(?P<alias>[A-Za-z_$][A-Za-z0-9_$]*))?\s*;"#;
const SOLIDITY_OBJECTS: &str =
    r"\b(?:contract|library)\s+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\s*(?:is\s[^{;]*)?\{";
const SOLIDITY_COMMENTS: &str = r"(?s://[^\n]*|/\*.*?\*/)";

/// An explicitly constructed table of language configurations.
///
/// Built once at startup and passed by reference; there is no global table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    languages: Vec<LanguageConfig>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the LLL, Serpent and Solidity entries, each
    /// caching under `<cache_root>/<key>`.
    pub fn with_defaults(cache_root: &Path) -> Result<Self, LanguageError> {
        let lll = LanguageConfig::new(
            LLL,
            "LLL",
            LLL_INCLUDE,
            &["lllc", ARGS_PLACEHOLDER],
            OutputFormat::HexBlob,
        )?
        .with_extensions(&["lll", "def"]);

        let serpent = LanguageConfig::new(
            SERPENT,
            "Serpent",
            SERPENT_INCLUDE,
            &["serpent", "compile", ARGS_PLACEHOLDER],
            OutputFormat::HexBlob,
        )?;

        let solidity = LanguageConfig::new(
            SOLIDITY,
            "Solidity",
            SOLIDITY_INCLUDE,
            &["solc", "--combined-json", "bin,abi", ARGS_PLACEHOLDER],
            OutputFormat::CombinedJson,
        )?
        .with_object_pattern(SOLIDITY_OBJECTS)?
        .with_comment_pattern(SOLIDITY_COMMENTS)?
        .with_flags(Some("--optimize"), Some("--libraries"));

        let mut registry = Self::new();
        for mut lang in [lll, serpent, solidity] {
            lang.cache_dir = cache_root.join(&lang.key);
            registry.insert(lang);
        }
        Ok(registry)
    }

    /// Adds or replaces the entry with the same key.
    pub fn insert(&mut self, language: LanguageConfig) {
        match self.languages.iter_mut().find(|l| l.key == language.key) {
            Some(existing) => *existing = language,
            None => self.languages.push(language),
        }
    }

    /// Looks up a language by key.
    pub fn get(&self, key: &str) -> Result<&LanguageConfig, LanguageError> {
        self.languages
            .iter()
            .find(|l| l.key == key)
            .ok_or_else(|| LanguageError::Unknown(key.to_string()))
    }

    /// Looks up a language by key for modification.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut LanguageConfig, LanguageError> {
        self.languages
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or_else(|| LanguageError::Unknown(key.to_string()))
    }

    /// Looks up a language by file extension (without the dot).
    pub fn for_extension(&self, ext: &str) -> Result<&LanguageConfig, LanguageError> {
        self.languages
            .iter()
            .find(|l| l.key == ext || l.has_extension(ext))
            .ok_or_else(|| LanguageError::Unknown(ext.to_string()))
    }

    /// Looks up the language of a source file from its extension.
    pub fn for_path(&self, path: &Path) -> Result<&LanguageConfig, LanguageError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.for_extension(ext)
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter()
    }

    /// Iterates mutably over all entries.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LanguageConfig> {
        self.languages.iter_mut()
    }
}
