//! The compile pipeline: full-hit check, route, compile, cache write.

use std::path::Path;
use std::time::Duration;

use kiln_cache::{declared_view, CacheStore};
use kiln_common::{CancelFlag, Request, Response};
use kiln_lang::{LanguageConfig, Registry};

use crate::backend::Backend;
use crate::error::CompileError;
use crate::local::LocalExecutor;
use crate::remote::RemoteClient;
use crate::request::{build_literal_request, build_request, RequestOptions};

/// Where a cache miss is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// Remote when the language has a URL, local otherwise.
    Configured,
    /// Always local.
    Local,
}

/// Answers compile requests from the cache or a backend.
///
/// Concurrent calls are safe; two calls for the same uncached graph may both
/// compile, and the second cache write simply replaces the first.
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    local: Box<dyn Backend + 'r>,
    remote: Box<dyn Backend + 'r>,
    cancel: Option<CancelFlag>,
}

impl<'r> Dispatcher<'r> {
    /// Creates a dispatcher using the external compilers and a remote client
    /// with the given request timeout.
    pub fn new(registry: &'r Registry, timeout: Duration) -> Self {
        Self::with_backends(
            registry,
            Box::new(LocalExecutor::new()),
            Box::new(RemoteClient::new(timeout)),
        )
    }

    /// Creates a dispatcher with explicit backends.
    pub fn with_backends(
        registry: &'r Registry,
        local: Box<dyn Backend + 'r>,
        remote: Box<dyn Backend + 'r>,
    ) -> Self {
        Self {
            registry,
            local,
            remote,
            cancel: None,
        }
    }

    /// Makes every compile observe `flag`.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The registry requests are looked up in.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Compiles a prepared request, routing misses per the language config.
    pub fn compile(&self, request: &Request) -> Result<Response, CompileError> {
        self.run(request, Route::Configured)
    }

    /// Compiles a prepared request with the local compiler regardless of any
    /// configured remote URL.
    pub fn compile_locally(&self, request: &Request) -> Result<Response, CompileError> {
        self.run(request, Route::Local)
    }

    /// Resolves the file at `path` and compiles it.
    pub fn compile_file(
        &self,
        path: &Path,
        options: &RequestOptions,
    ) -> Result<Response, CompileError> {
        let request = build_request(self.registry, path, options, self.cancel.as_ref())?;
        self.compile(&request)
    }

    /// Resolves literal `source` in `language` and compiles it.
    pub fn compile_source(
        &self,
        language: &str,
        script_name: &str,
        source: &[u8],
        base_dir: &Path,
        options: &RequestOptions,
    ) -> Result<Response, CompileError> {
        let request = build_literal_request(
            self.registry,
            language,
            script_name,
            source,
            base_dir,
            options,
            self.cancel.as_ref(),
        )?;
        self.compile(&request)
    }

    /// Empties the cache of `language`, or of every registered language when
    /// `None`. Returns the number of entries removed.
    pub fn clear_cache(&self, language: Option<&str>) -> Result<usize, CompileError> {
        let mut removed = 0;
        match language {
            Some(key) => {
                let language = self
                    .registry
                    .get(key)
                    .map_err(|_| CompileError::UnknownLanguage(key.to_string()))?;
                removed += CacheStore::new(&language.cache_dir).clear()?;
            }
            None => {
                for language in self.registry.iter() {
                    removed += CacheStore::new(&language.cache_dir).clear()?;
                }
            }
        }
        tracing::info!(removed, language = language.unwrap_or("all"), "cache cleared");
        Ok(removed)
    }

    fn run(&self, request: &Request, route: Route) -> Result<Response, CompileError> {
        let language = self
            .registry
            .get(&request.language)
            .map_err(|_| CompileError::UnknownLanguage(request.language.clone()))?;
        self.check_cancel()?;

        let store = CacheStore::new(&language.cache_dir);
        if !request.includes.is_empty() && store.is_fully_cached(&request.includes)? {
            tracing::info!(
                script = %request.script_name,
                units = request.includes.len(),
                "using cached artifacts"
            );
            return Ok(store.read_cached(&request.includes)?);
        }

        let backend = self.backend_for(language, route);
        tracing::info!(
            script = %request.script_name,
            language = %language.key,
            remote = ?language.remote_url.as_deref().filter(|_| route == Route::Configured),
            "compiling"
        );
        let response = backend.compile(request, language)?;

        if response.is_failure() {
            tracing::warn!(script = %request.script_name, "compilation failed");
            return Ok(response);
        }
        self.check_cancel()?;

        store.write_cache(&response, request)?;
        Ok(declared_view(&response, &request.includes))
    }

    fn backend_for(&self, language: &LanguageConfig, route: Route) -> &dyn Backend {
        match route {
            Route::Configured if language.is_remote() => self.remote.as_ref(),
            _ => self.local.as_ref(),
        }
    }

    fn check_cancel(&self) -> Result<(), CompileError> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(CompileError::Cancelled);
        }
        Ok(())
    }
}
