//! Building wire requests from files or literal source.

use std::path::Path;

use kiln_common::{CancelFlag, HashIdentity, Request};
use kiln_lang::{LanguageConfig, Registry};
use kiln_resolve::{Resolution, Resolver};

use crate::error::CompileError;

/// Per-compile options that do not come from the source itself.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Library address text handed to the compiler.
    pub libraries: String,
    /// Whether to ask the compiler to optimize.
    pub optimize: bool,
}

/// Resolves the file at `path` and builds a request for it.
///
/// The language is chosen from the file's extension.
pub fn build_request(
    registry: &Registry,
    path: &Path,
    options: &RequestOptions,
    cancel: Option<&CancelFlag>,
) -> Result<Request, CompileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let language = registry
        .for_extension(ext)
        .map_err(|_| CompileError::UnknownLanguage(ext.to_string()))?;

    let resolution = resolver(language, cancel).resolve_file(path)?;
    let script_name = path.display().to_string();
    Ok(assemble(language, script_name, resolution, options))
}

/// Builds a request from literal source text in `language`.
///
/// Includes inside `source` are resolved relative to `base_dir`.
pub fn build_literal_request(
    registry: &Registry,
    language: &str,
    script_name: &str,
    source: &[u8],
    base_dir: &Path,
    options: &RequestOptions,
    cancel: Option<&CancelFlag>,
) -> Result<Request, CompileError> {
    let language = registry
        .get(language)
        .map_err(|_| CompileError::UnknownLanguage(language.to_string()))?;
    let resolution = resolver(language, cancel).resolve_source(source, base_dir, script_name)?;
    Ok(assemble(language, script_name.to_string(), resolution, options))
}

/// Checks that every unit of a request received from a peer is stored
/// under the identity of its own script.
pub fn verify_identities(request: &Request) -> Result<(), CompileError> {
    for (id, unit) in &request.includes {
        if HashIdentity::from_source(&unit.script, &request.language) != *id {
            return Err(CompileError::IdentityMismatch {
                identity: id.to_string(),
            });
        }
    }
    Ok(())
}

fn resolver<'a>(language: &'a LanguageConfig, cancel: Option<&'a CancelFlag>) -> Resolver<'a> {
    let resolver = Resolver::new(language);
    match cancel {
        Some(flag) => resolver.with_cancel(flag),
        None => resolver,
    }
}

fn assemble(
    language: &LanguageConfig,
    script_name: String,
    resolution: Resolution,
    options: &RequestOptions,
) -> Request {
    let file_replacement = resolution.file_replacement();
    Request {
        script_name,
        language: language.key.clone(),
        includes: resolution.includes,
        libraries: options.libraries.clone(),
        optimize: options.optimize,
        file_replacement,
        entry: Some(resolution.entry),
    }
}
