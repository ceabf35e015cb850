//! Running the external compiler on this machine.
//!
//! Every unit of the request is staged into a private directory under the
//! language's cache dir, named by its hash identity, so the rewritten include
//! statements resolve against the staged copies. The compiler runs with that
//! directory as its working directory; the process's own cwd never changes.

use std::path::Path;
use std::process::Command;

use kiln_common::{HashIdentity, Request, Response};
use kiln_lang::{object_name_for_script, LanguageConfig};

use crate::backend::Backend;
use crate::error::CompileError;

const LIBRARIES_FILE: &str = "libraries.txt";

/// Compiles requests with the language's configured command.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Creates a local executor.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for LocalExecutor {
    fn compile(
        &self,
        request: &Request,
        language: &LanguageConfig,
    ) -> Result<Response, CompileError> {
        let entry = entry_unit(request)
            .ok_or_else(|| CompileError::Decode("request has no source units".to_string()))?;

        std::fs::create_dir_all(&language.cache_dir).map_err(|e| {
            CompileError::io(
                format!("failed to create {}", language.cache_dir.display()),
                e,
            )
        })?;
        let stage = tempfile::Builder::new()
            .prefix(".stage-")
            .tempdir_in(&language.cache_dir)
            .map_err(|e| CompileError::io("failed to create staging directory", e))?;

        for (id, unit) in &request.includes {
            let path = stage.path().join(id.as_str());
            std::fs::write(&path, &unit.script)
                .map_err(|e| CompileError::io(format!("failed to stage {}", path.display()), e))?;
        }

        let libraries = if !request.libraries.is_empty() && language.libraries_flag.is_some() {
            let path = stage.path().join(LIBRARIES_FILE);
            std::fs::write(&path, request.libraries.as_bytes())
                .map_err(|e| CompileError::io("failed to write libraries file", e))?;
            Some(Path::new(LIBRARIES_FILE))
        } else {
            None
        };

        let files: Vec<String> = if language.output.takes_all_units() {
            request.includes.keys().map(|id| id.to_string()).collect()
        } else {
            vec![entry.to_string()]
        };
        let args = language.command_line(&files, libraries, request.optimize);
        let Some((program, rest)) = args.split_first() else {
            return Err(CompileError::Decode(format!(
                "no compiler command configured for {}",
                language.key
            )));
        };

        tracing::debug!(language = %language.key, command = ?args, "running compiler");
        let output = Command::new(program)
            .args(rest)
            .current_dir(stage.path())
            .output()
            .map_err(|e| CompileError::io(format!("failed to run {program}"), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let mut message = combine_output(&stderr, &stdout);
            if message.is_empty() {
                message = format!("{program} exited with {}", output.status);
            }
            let message = restore_paths(&message, stage.path(), request);
            tracing::info!(language = %language.key, "compiler reported errors");
            return Ok(Response::failure(message));
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(language = %language.key, stderr = %stderr.trim(), "compiler stderr");
        }

        let object_name = request
            .includes
            .get(&entry)
            .and_then(|unit| unit.object_names.first().cloned())
            .unwrap_or_else(|| object_name_for_script(&request.script_name));
        let objects = language
            .output
            .decode(&language.key, &stdout, &object_name)
            .map_err(|e| CompileError::Decode(e.to_string()))?;
        Ok(Response::success(objects))
    }
}

/// The unit the compiler is pointed at.
///
/// Requests from older clients carry no explicit entry; the entry is then the
/// unit no other unit includes.
fn entry_unit(request: &Request) -> Option<HashIdentity> {
    if let Some(entry) = &request.entry {
        return Some(entry.clone());
    }
    let referenced = |id: &HashIdentity| {
        let needle = id.as_str().as_bytes();
        request
            .includes
            .iter()
            .filter(|(other, _)| *other != id)
            .any(|(_, unit)| unit.script.windows(needle.len()).any(|w| w == needle))
    };
    request
        .includes
        .keys()
        .find(|id| !referenced(*id))
        .or_else(|| request.includes.keys().next())
        .cloned()
}

/// Rewrites staged file names in compiler output back to the user's paths.
/// Joins the non-empty streams of a failed run, stderr first, one per line.
fn combine_output(stderr: &str, stdout: &str) -> String {
    [stderr.trim_end(), stdout.trim_end()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn restore_paths(message: &str, stage: &Path, request: &Request) -> String {
    let mut out = message.to_string();
    for (staged, original) in &request.file_replacement {
        let full = stage.join(staged).display().to_string();
        out = out.replace(&full, original).replace(staged.as_str(), original);
    }
    out
}
