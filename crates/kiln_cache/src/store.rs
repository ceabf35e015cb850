//! The on-disk artifact store for one language.
//!
//! Layout: `<cache_dir>/<identity>/<object>-bin` and `<object>-abi`.

use std::io::Write;
use std::path::{Path, PathBuf};

use kiln_common::{HashIdentity, IncludesMap, Request, Response, ResponseItem};

use crate::error::CacheError;

/// Suffix of bytecode artifact files.
const BIN_SUFFIX: &str = "-bin";

/// Suffix of ABI artifact files.
const ABI_SUFFIX: &str = "-abi";

/// What a [`CacheStore::write_cache`] call persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of entry directories ensured.
    pub entries: usize,
    /// Number of objects whose artifacts were written.
    pub objects_written: usize,
    /// Declared objects the response did not contain.
    pub skipped: Vec<String>,
}

/// Content-addressed artifact store rooted at one language's cache directory.
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `cache_dir`. Nothing is created on disk
    /// until the first write.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the entry directory for an identity.
    pub fn entry_dir(&self, id: &HashIdentity) -> PathBuf {
        self.cache_dir.join(id.as_str())
    }

    /// Returns the bytecode and ABI paths for an object of an entry.
    pub fn artifact_paths(
        &self,
        id: &HashIdentity,
        object: &str,
    ) -> Result<(PathBuf, PathBuf), CacheError> {
        validate_object_name(object)?;
        let dir = self.entry_dir(id);
        Ok((
            dir.join(format!("{object}{BIN_SUFFIX}")),
            dir.join(format!("{object}{ABI_SUFFIX}")),
        ))
    }

    /// Returns `true` only if every unit's entry directory exists and every
    /// declared object has both artifacts.
    ///
    /// A single missing piece makes the whole graph a miss.
    pub fn is_fully_cached(&self, includes: &IncludesMap) -> Result<bool, CacheError> {
        for (id, unit) in includes {
            if !self.entry_dir(id).is_dir() {
                tracing::debug!(identity = %id, "cache entry missing");
                return Ok(false);
            }
            for object in &unit.object_names {
                let (bin, abi) = self.artifact_paths(id, object)?;
                if !bin.is_file() || !abi.is_file() {
                    tracing::debug!(identity = %id, object = %object, "cached artifact missing");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Reads every declared object's artifacts into a response.
    ///
    /// Intended to follow a successful [`is_fully_cached`](Self::is_fully_cached);
    /// an artifact that has vanished since is an error, not a miss.
    pub fn read_cached(&self, includes: &IncludesMap) -> Result<Response, CacheError> {
        let mut objects = Vec::new();
        for (id, unit) in includes {
            for object in &unit.object_names {
                let (bin, abi) = self.artifact_paths(id, object)?;
                objects.push(ResponseItem {
                    object_name: object.clone(),
                    bytecode: read_artifact(&bin)?,
                    abi: read_artifact(&abi)?,
                });
            }
        }
        Ok(Response::success(objects))
    }

    /// Persists a successful response for every unit of `request`.
    ///
    /// Each unit's directory is created (idempotently) and artifacts are
    /// written for every declared object the response contains. Declared
    /// objects missing from the response are skipped, not errors.
    pub fn write_cache(
        &self,
        response: &Response,
        request: &Request,
    ) -> Result<WriteSummary, CacheError> {
        let mut summary = WriteSummary::default();
        for (id, unit) in &request.includes {
            let dir = self.entry_dir(id);
            std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
                path: dir.clone(),
                source: e,
            })?;
            summary.entries += 1;

            for name in &unit.object_names {
                let Some(item) = response.object(name) else {
                    summary.skipped.push(name.clone());
                    continue;
                };
                let (bin, abi) = self.artifact_paths(id, name)?;
                write_artifact(&dir, &bin, item.bytecode.as_bytes())?;
                write_artifact(&dir, &abi, item.abi.as_bytes())?;
                summary.objects_written += 1;
            }
        }

        if !summary.skipped.is_empty() {
            tracing::warn!(
                skipped = ?summary.skipped,
                "compiled response lacked some declared objects; cached the rest"
            );
        }
        tracing::debug!(
            entries = summary.entries,
            objects = summary.objects_written,
            root = %self.cache_dir.display(),
            "cache written"
        );
        Ok(summary)
    }

    /// Removes every entry under this store's root. Returns the number of
    /// top-level entries removed; a missing root counts as empty.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(CacheError::Io {
                    path: self.cache_dir.clone(),
                    source: e,
                })
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.cache_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Narrows a compiled response to the objects `includes` declares, ordered
/// by unit then declaration, which is the shape
/// [`CacheStore::read_cached`] returns.
///
/// A response is left as is when no unit declares anything.
pub fn declared_view(response: &Response, includes: &IncludesMap) -> Response {
    if includes.values().all(|unit| unit.object_names.is_empty()) {
        return response.clone();
    }
    let objects: Vec<ResponseItem> = includes
        .values()
        .flat_map(|unit| unit.object_names.iter())
        .filter_map(|name| response.object(name).cloned())
        .collect();
    if objects.len() < response.objects.len() {
        tracing::debug!(
            dropped = response.objects.len() - objects.len(),
            "compiled objects not declared by any unit"
        );
    }
    Response {
        objects,
        error: response.error.clone(),
    }
}

/// Object names become file names; reject anything that is not a plain
/// path component.
fn validate_object_name(name: &str) -> Result<(), CacheError> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if ok {
        Ok(())
    } else {
        Err(CacheError::InvalidObjectName {
            name: name.to_string(),
        })
    }
}

fn read_artifact(path: &Path) -> Result<String, CacheError> {
    std::fs::read_to_string(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes through a temp file in the same directory and renames it into
/// place, so readers never see a partial artifact.
fn write_artifact(dir: &Path, path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let io_err = |e: std::io::Error| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(data).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::IncludedFile;
    use std::collections::BTreeMap;

    fn unit(script: &str, objects: &[&str]) -> (HashIdentity, IncludedFile) {
        (
            HashIdentity::from_source(script.as_bytes(), "sol"),
            IncludedFile {
                object_names: objects.iter().map(|s| (*s).to_string()).collect(),
                script: script.as_bytes().to_vec(),
            },
        )
    }

    fn request(units: Vec<(HashIdentity, IncludedFile)>) -> Request {
        Request {
            script_name: "main.sol".to_string(),
            language: "sol".to_string(),
            includes: units.into_iter().collect(),
            libraries: String::new(),
            optimize: false,
            file_replacement: BTreeMap::new(),
            entry: None,
        }
    }

    fn item(name: &str, bin: &str) -> ResponseItem {
        ResponseItem {
            object_name: name.to_string(),
            bytecode: bin.to_string(),
            abi: format!("[{{\"name\":\"{name}\"}}]"),
        }
    }

    #[test]
    fn empty_store_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("sol"));
        let req = request(vec![unit("contract A {}", &["A"])]);
        assert!(!store.is_fully_cached(&req.includes).unwrap());
    }

    #[test]
    fn declared_view_matches_cached_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("sol"));
        let req = request(vec![
            unit("contract Alpha {}", &["Alpha"]),
            unit("library Zeta {}", &["Zeta"]),
        ]);
        let compiled = Response::success(vec![
            item("Alpha", "01"),
            item("IToken", "02"),
            item("Zeta", "03"),
        ]);

        store.write_cache(&compiled, &req).unwrap();
        let view = declared_view(&compiled, &req.includes);
        assert_eq!(view, store.read_cached(&req.includes).unwrap());
        assert!(view.object("IToken").is_none());
    }

    #[test]
    fn declared_view_without_declarations_is_unchanged() {
        let req = request(vec![unit("(stop)", &[])]);
        let compiled = Response::success(vec![item("main", "00")]);
        assert_eq!(declared_view(&compiled, &req.includes), compiled);
    }

    #[test]
    fn write_then_full_hit_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("sol"));
        let req = request(vec![
            unit("library L {}", &["L"]),
            unit("contract A {} contract B {}", &["A", "B"]),
        ]);
        let resp = Response::success(vec![item("A", "60a"), item("B", "60b"), item("L", "60c")]);

        let summary = store.write_cache(&resp, &req).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.objects_written, 3);
        assert!(summary.skipped.is_empty());

        assert!(store.is_fully_cached(&req.includes).unwrap());
        let cached = store.read_cached(&req.includes).unwrap();
        assert_eq!(cached.objects.len(), 3);
        assert_eq!(cached.object("B").unwrap().bytecode, "60b");
        assert_eq!(cached.object("L").unwrap().abi, "[{\"name\":\"L\"}]");
        assert!(!cached.is_failure());
    }

    #[test]
    fn layout_matches_identity_and_object_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let (id, file) = unit("contract Token {}", &["Token"]);
        let req = request(vec![(id.clone(), file)]);
        store
            .write_cache(&Response::success(vec![item("Token", "6060")]), &req)
            .unwrap();
        let entry = dir.path().join(id.as_str());
        assert_eq!(std::fs::read_to_string(entry.join("Token-bin")).unwrap(), "6060");
        assert!(entry.join("Token-abi").is_file());
    }

    #[test]
    fn missing_declared_object_is_skipped_and_not_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let req = request(vec![unit("contract A {} contract Gone {}", &["A", "Gone"])]);
        let summary = store
            .write_cache(&Response::success(vec![item("A", "60")]), &req)
            .unwrap();
        assert_eq!(summary.skipped, vec!["Gone"]);
        assert_eq!(summary.objects_written, 1);
        assert!(!store.is_fully_cached(&req.includes).unwrap());
    }

    #[test]
    fn unit_without_objects_hits_once_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let req = request(vec![unit("// only comments", &[])]);
        assert!(!store.is_fully_cached(&req.includes).unwrap());
        store.write_cache(&Response::success(vec![]), &req).unwrap();
        assert!(store.is_fully_cached(&req.includes).unwrap());
        assert!(store.read_cached(&req.includes).unwrap().objects.is_empty());
    }

    #[test]
    fn one_missing_artifact_fails_whole_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let (id_a, a) = unit("contract A {}", &["A"]);
        let (id_b, b) = unit("contract B {}", &["B"]);
        let req = request(vec![(id_a, a), (id_b.clone(), b)]);
        store
            .write_cache(&Response::success(vec![item("A", "1"), item("B", "2")]), &req)
            .unwrap();
        std::fs::remove_file(dir.path().join(id_b.as_str()).join("B-abi")).unwrap();
        assert!(!store.is_fully_cached(&req.includes).unwrap());
    }

    #[test]
    fn vanished_artifact_is_a_hard_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let (id, file) = unit("contract A {}", &["A"]);
        let req = request(vec![(id.clone(), file)]);
        store
            .write_cache(&Response::success(vec![item("A", "1")]), &req)
            .unwrap();
        std::fs::remove_file(dir.path().join(id.as_str()).join("A-bin")).unwrap();
        let err = store.read_cached(&req.includes).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let req = request(vec![unit("contract A {}", &["A"])]);
        let resp = Response::success(vec![item("A", "6060")]);
        store.write_cache(&resp, &req).unwrap();
        store.write_cache(&resp, &req).unwrap();
        assert_eq!(store.read_cached(&req.includes).unwrap(), resp);
    }

    #[test]
    fn traversal_object_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let req = request(vec![unit("x", &["../../escape"])]);
        store.write_cache(&Response::success(vec![]), &req).unwrap();
        let err = store.is_fully_cached(&req.includes).unwrap_err();
        assert!(matches!(err, CacheError::InvalidObjectName { .. }));
    }

    #[test]
    fn clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("sol"));
        let req = request(vec![unit("contract A {}", &["A"]), unit("contract B {}", &["B"])]);
        store
            .write_cache(&Response::success(vec![item("A", "1"), item("B", "2")]), &req)
            .unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert!(!store.is_fully_cached(&req.includes).unwrap());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn clear_missing_root_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(&dir.path().join("never-created"));
        assert_eq!(store.clear().unwrap(), 0);
    }
}
