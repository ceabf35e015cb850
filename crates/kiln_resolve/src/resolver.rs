//! Depth-first, post-order include resolution.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use kiln_common::{CancelFlag, HashIdentity, IncludedFile, IncludesMap};
use kiln_lang::LanguageConfig;

use crate::error::ResolveError;

/// The outcome of resolving one top-level source unit.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Identity of the rewritten top-level source.
    pub entry: HashIdentity,
    /// The top-level source with every include rewritten to an identity.
    pub source: Vec<u8>,
    /// Every unit of the include graph, the top-level unit included.
    pub includes: IncludesMap,
    /// Where each identity was first read from.
    pub origins: BTreeMap<HashIdentity, PathBuf>,
}

impl Resolution {
    /// Maps identity file names to the paths they came from, for rewriting
    /// compiler messages.
    pub fn file_replacement(&self) -> BTreeMap<String, String> {
        self.origins
            .iter()
            .map(|(id, path)| (id.to_string(), path.display().to_string()))
            .collect()
    }
}

/// Accumulator threaded through one resolution pass.
#[derive(Default)]
struct PassState {
    includes: IncludesMap,
    origins: BTreeMap<HashIdentity, PathBuf>,
    /// Files whose resolution is finished, by canonical path.
    completed: HashMap<PathBuf, HashIdentity>,
    /// Canonical and display paths of files currently being resolved.
    in_progress: Vec<(PathBuf, PathBuf)>,
}

impl PassState {
    /// Adds a unit to the map, merging object names into an existing entry
    /// with the same identity.
    fn insert(&mut self, id: &HashIdentity, objects: Vec<String>, script: Vec<u8>, origin: &Path) {
        match self.includes.get_mut(id) {
            Some(existing) => {
                for name in objects {
                    if !existing.object_names.contains(&name) {
                        existing.object_names.push(name);
                    }
                }
            }
            None => {
                self.includes.insert(
                    id.clone(),
                    IncludedFile {
                        object_names: objects,
                        script,
                    },
                );
            }
        }
        self.origins
            .entry(id.clone())
            .or_insert_with(|| origin.to_path_buf());
    }
}

/// Resolves includes for one language.
pub struct Resolver<'a> {
    language: &'a LanguageConfig,
    cancel: Option<&'a CancelFlag>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver using `language`'s include and object patterns.
    pub fn new(language: &'a LanguageConfig) -> Self {
        Self {
            language,
            cancel: None,
        }
    }

    /// Makes the resolver stop with [`ResolveError::Cancelled`] once `flag`
    /// is set.
    pub fn with_cancel(mut self, flag: &'a CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Reads and resolves a source file.
    ///
    /// Includes are resolved relative to the file's directory; the file's
    /// own declared objects are named after its stem when the language has
    /// no object pattern.
    pub fn resolve_file(&self, path: &Path) -> Result<Resolution, ResolveError> {
        let code = std::fs::read(path).map_err(|source| ResolveError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        let canonical = std::fs::canonicalize(path).map_err(|source| ResolveError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = parent_dir(path);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let mut state = PassState::default();
        state.in_progress.push((canonical.clone(), path.to_path_buf()));
        self.finish(&code, dir, name, path, state)
    }

    /// Resolves literal source text whose includes are relative to `base_dir`.
    pub fn resolve_source(
        &self,
        source: &[u8],
        base_dir: &Path,
        script_name: &str,
    ) -> Result<Resolution, ResolveError> {
        let origin = base_dir.join(script_name);
        self.finish(source, base_dir, script_name, &origin, PassState::default())
    }

    fn finish(
        &self,
        code: &[u8],
        dir: &Path,
        script_name: &str,
        origin: &Path,
        mut state: PassState,
    ) -> Result<Resolution, ResolveError> {
        let source = self.resolve_unit(code, dir, origin, &mut state)?;
        let entry = HashIdentity::from_source(&source, &self.language.key);
        let objects = self.language.declared_objects(&source, Some(script_name));
        state.insert(&entry, objects, source.clone(), origin);

        tracing::debug!(
            language = %self.language.key,
            entry = %entry,
            units = state.includes.len(),
            "resolved include graph"
        );

        Ok(Resolution {
            entry,
            source,
            includes: state.includes,
            origins: state.origins,
        })
    }

    /// Rewrites the includes of one unit, recursing into each included file
    /// before hashing it.
    fn resolve_unit(
        &self,
        code: &[u8],
        dir: &Path,
        current: &Path,
        state: &mut PassState,
    ) -> Result<Vec<u8>, ResolveError> {
        let matches = self.language.find_includes(code);
        if matches.is_empty() {
            return Ok(code.to_vec());
        }

        let mut out = Vec::with_capacity(code.len());
        let mut last = 0;
        for m in matches {
            if self.cancel.is_some_and(CancelFlag::is_cancelled) {
                return Err(ResolveError::Cancelled);
            }
            if m.path.trim().is_empty() || m.path.contains(char::REPLACEMENT_CHARACTER) {
                return Err(ResolveError::Malformed {
                    statement: String::from_utf8_lossy(&code[m.statement.clone()]).into_owned(),
                    included_from: current.to_path_buf(),
                });
            }

            let id = self.resolve_include(&dir.join(&m.path), current, state)?;
            out.extend_from_slice(&code[last..m.path_span.start]);
            out.extend_from_slice(id.as_str().as_bytes());
            last = m.path_span.end;
        }
        out.extend_from_slice(&code[last..]);
        Ok(out)
    }

    fn resolve_include(
        &self,
        path: &Path,
        current: &Path,
        state: &mut PassState,
    ) -> Result<HashIdentity, ResolveError> {
        let read_err = |source| ResolveError::IncludeRead {
            path: path.to_path_buf(),
            included_from: current.to_path_buf(),
            source,
        };
        let canonical = std::fs::canonicalize(path).map_err(read_err)?;

        if let Some(id) = state.completed.get(&canonical) {
            tracing::debug!(path = %path.display(), identity = %id, "include already resolved");
            return Ok(id.clone());
        }
        if state.in_progress.iter().any(|(c, _)| *c == canonical) {
            let mut chain: Vec<PathBuf> = state.in_progress.iter().map(|(_, d)| d.clone()).collect();
            chain.push(path.to_path_buf());
            return Err(ResolveError::Cycle { chain });
        }

        let code = std::fs::read(&canonical).map_err(read_err)?;
        let child_dir = parent_dir(path).to_path_buf();

        state.in_progress.push((canonical.clone(), path.to_path_buf()));
        let resolved = self.resolve_unit(&code, &child_dir, path, state)?;
        state.in_progress.pop();

        let id = HashIdentity::from_source(&resolved, &self.language.key);
        if state.includes.contains_key(&id) {
            tracing::debug!(path = %path.display(), identity = %id, "include deduplicated");
        } else {
            let objects = self.language.declared_objects(&resolved, None);
            state.insert(&id, objects, resolved, path);
            tracing::debug!(path = %path.display(), identity = %id, "resolved include");
        }
        state.completed.insert(canonical, id.clone());
        Ok(id)
    }
}

/// Directory that relative includes of `path` are resolved against: the
/// directory the file was named in, not the one a symlink points into.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
