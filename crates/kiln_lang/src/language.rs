//! A single language's configuration record.

use std::ops::Range;
use std::path::{Path, PathBuf};

use regex::bytes::Regex;

use crate::decode::OutputFormat;
use crate::error::LanguageError;

/// The token in a command template replaced by the positional arguments.
pub const ARGS_PLACEHOLDER: &str = "_";

/// An include/import statement located in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeMatch {
    /// Byte range of the whole statement.
    pub statement: Range<usize>,
    /// Byte range of the referenced path inside the statement's quotes.
    pub path_span: Range<usize>,
    /// The referenced path as written.
    pub path: String,
    /// The quote character, when the pattern captures one.
    pub quote: Option<char>,
    /// The `as <alias>` name, when present.
    pub alias: Option<String>,
}

/// Configuration for one contract language.
///
/// Include patterns use the named groups `path` (required), `quote` and
/// `alias` (both optional).
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Registry key, also the extension used in hash identities.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// File extensions (without the dot) that map to this language.
    pub extensions: Vec<String>,
    /// Directory holding this language's cache entries and staging dirs.
    pub cache_dir: PathBuf,
    /// Command template; [`ARGS_PLACEHOLDER`] marks where arguments go.
    pub command: Vec<String>,
    /// Flag passed when a request asks for optimization, if supported.
    pub optimize_flag: Option<String>,
    /// Flag preceding the library-address file, if supported.
    pub libraries_flag: Option<String>,
    /// How the compiler's stdout is decoded.
    pub output: OutputFormat,
    /// Remote compile endpoint; `None` compiles locally.
    pub remote_url: Option<String>,
    include_pattern: Regex,
    object_pattern: Option<Regex>,
    comment_pattern: Option<Regex>,
}

impl LanguageConfig {
    /// Creates a language entry from its patterns and command template.
    pub fn new(
        key: &str,
        name: &str,
        include_pattern: &str,
        command: &[&str],
        output: OutputFormat,
    ) -> Result<Self, LanguageError> {
        Ok(Self {
            key: key.to_string(),
            name: name.to_string(),
            extensions: vec![key.to_string()],
            cache_dir: PathBuf::from(key),
            command: command.iter().map(|s| (*s).to_string()).collect(),
            optimize_flag: None,
            libraries_flag: None,
            output,
            remote_url: None,
            include_pattern: compile_pattern(key, include_pattern)?,
            object_pattern: None,
            comment_pattern: None,
        })
    }

    /// Sets the pattern used to scan for declared object names.
    ///
    /// The pattern must capture the name in a group called `name`.
    pub fn with_object_pattern(mut self, pattern: &str) -> Result<Self, LanguageError> {
        self.object_pattern = Some(compile_pattern(&self.key, pattern)?);
        Ok(self)
    }

    /// Sets the pattern for comments, which are blanked out before scanning
    /// for declared objects.
    pub fn with_comment_pattern(mut self, pattern: &str) -> Result<Self, LanguageError> {
        self.comment_pattern = Some(compile_pattern(&self.key, pattern)?);
        Ok(self)
    }

    /// Sets the accepted file extensions.
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the optimize and libraries flags.
    pub fn with_flags(mut self, optimize: Option<&str>, libraries: Option<&str>) -> Self {
        self.optimize_flag = optimize.map(str::to_string);
        self.libraries_flag = libraries.map(str::to_string);
        self
    }

    /// Replaces the compiler binary (the first token of the template).
    pub fn set_compiler(&mut self, program: &str) {
        match self.command.first_mut() {
            Some(first) => *first = program.to_string(),
            None => self.command = vec![program.to_string(), ARGS_PLACEHOLDER.to_string()],
        }
    }

    /// Returns `true` if `ext` (without the dot) belongs to this language.
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    /// Returns `true` if requests for this language go to a remote service.
    pub fn is_remote(&self) -> bool {
        self.remote_url.is_some()
    }

    /// Finds every include statement in `source`, left to right.
    pub fn find_includes(&self, source: &[u8]) -> Vec<IncludeMatch> {
        self.include_pattern
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let path = caps.name("path")?;
                Some(IncludeMatch {
                    statement: whole.range(),
                    path_span: path.range(),
                    path: String::from_utf8_lossy(path.as_bytes()).into_owned(),
                    quote: caps
                        .name("quote")
                        .and_then(|q| q.as_bytes().first().map(|b| char::from(*b))),
                    alias: caps
                        .name("alias")
                        .map(|a| String::from_utf8_lossy(a.as_bytes()).into_owned()),
                })
            })
            .collect()
    }

    /// Scans `source` for declared contract/library names.
    ///
    /// Languages without an object pattern declare a single object named
    /// after the script, and only for the top-level unit (`script_name` is
    /// `Some`). Included units of such languages declare nothing.
    pub fn declared_objects(&self, source: &[u8], script_name: Option<&str>) -> Vec<String> {
        match &self.object_pattern {
            Some(pattern) => {
                let text = match &self.comment_pattern {
                    Some(comments) => comments.replace_all(source, &b" "[..]),
                    None => std::borrow::Cow::Borrowed(source),
                };
                let mut names: Vec<String> = Vec::new();
                for caps in pattern.captures_iter(&text) {
                    if let Some(m) = caps.name("name") {
                        let name = String::from_utf8_lossy(m.as_bytes()).into_owned();
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
                names
            }
            None => script_name
                .map(|n| vec![object_name_for_script(n)])
                .unwrap_or_default(),
        }
    }

    /// Expands the command template.
    ///
    /// The placeholder becomes, in order: the optimize flag (when requested
    /// and supported), the libraries flag and file (when given and
    /// supported), then `files`.
    pub fn command_line(
        &self,
        files: &[String],
        libraries_file: Option<&Path>,
        optimize: bool,
    ) -> Vec<String> {
        let mut args = Vec::with_capacity(self.command.len() + files.len() + 3);
        for token in &self.command {
            if token != ARGS_PLACEHOLDER {
                args.push(token.clone());
                continue;
            }
            if optimize {
                if let Some(flag) = &self.optimize_flag {
                    args.push(flag.clone());
                }
            }
            if let (Some(flag), Some(file)) = (&self.libraries_flag, libraries_file) {
                args.push(flag.clone());
                args.push(file.display().to_string());
            }
            args.extend(files.iter().cloned());
        }
        args
    }
}

/// Derives an object name from a script path: the file stem.
pub fn object_name_for_script(script_name: &str) -> String {
    Path::new(script_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(script_name)
        .to_string()
}

fn compile_pattern(key: &str, pattern: &str) -> Result<Regex, LanguageError> {
    Regex::new(pattern).map_err(|source| LanguageError::InvalidPattern {
        language: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> LanguageConfig {
        LanguageConfig::new(
            "toy",
            "Toy",
            r#"use\s+(?P<quote>["'])(?P<path>[^"']+)["'](?:\s+as\s+(?P<alias>\w+))?;"#,
            &["toyc", "--json", ARGS_PLACEHOLDER],
            OutputFormat::CombinedJson,
        )
        .unwrap()
        .with_flags(Some("-O"), Some("--libs"))
    }

    #[test]
    fn find_includes_left_to_right() {
        let src = br#"use "a.toy"; x; use 'lib/b.toy' as B;"#;
        let found = toy().find_includes(src);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, "a.toy");
        assert_eq!(found[0].quote, Some('"'));
        assert_eq!(&src[found[0].path_span.clone()], b"a.toy");
        assert_eq!(found[1].path, "lib/b.toy");
        assert_eq!(found[1].quote, Some('\''));
        assert_eq!(found[1].alias.as_deref(), Some("B"));
        assert!(found[0].statement.end <= found[1].statement.start);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = LanguageConfig::new("bad", "Bad", "(unclosed", &[], OutputFormat::HexBlob)
            .unwrap_err();
        assert!(matches!(err, LanguageError::InvalidPattern { .. }));
    }

    #[test]
    fn command_line_expands_placeholder() {
        let files = vec!["a.toy".to_string(), "b.toy".to_string()];
        let args = toy().command_line(&files, Some(Path::new("libs.txt")), true);
        assert_eq!(
            args,
            vec!["toyc", "--json", "-O", "--libs", "libs.txt", "a.toy", "b.toy"]
        );
    }

    #[test]
    fn command_line_skips_unrequested_flags() {
        let files = vec!["a.toy".to_string()];
        let args = toy().command_line(&files, None, false);
        assert_eq!(args, vec!["toyc", "--json", "a.toy"]);
    }

    #[test]
    fn unsupported_flags_are_dropped() {
        let lang = toy().with_flags(None, None);
        let args = lang.command_line(&["a".to_string()], Some(Path::new("l")), true);
        assert_eq!(args, vec!["toyc", "--json", "a"]);
    }

    #[test]
    fn declared_objects_without_pattern() {
        let lang = toy();
        assert_eq!(
            lang.declared_objects(b"anything", Some("dir/wallet.toy")),
            vec!["wallet"]
        );
        assert!(lang.declared_objects(b"anything", None).is_empty());
    }

    #[test]
    fn declared_objects_with_pattern_dedups() {
        let lang = toy()
            .with_object_pattern(r"\bthing\s+(?P<name>\w+)")
            .unwrap();
        let names = lang.declared_objects(b"thing A {} thing B {} thing A {}", Some("x"));
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn comments_are_not_scanned_for_objects() {
        let lang = toy()
            .with_object_pattern(r"\bthing\s+(?P<name>\w+)\s*\{")
            .unwrap()
            .with_comment_pattern(r"#[^\n]*")
            .unwrap();
        let names = lang.declared_objects(b"# thing Ghost {\nthing Real {}", Some("x"));
        assert_eq!(names, vec!["Real"]);
    }

    #[test]
    fn set_compiler_replaces_program() {
        let mut lang = toy();
        lang.set_compiler("/opt/toyc");
        assert_eq!(lang.command[0], "/opt/toyc");
        assert_eq!(lang.command.len(), 3);
    }
}
