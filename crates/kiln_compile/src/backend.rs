//! The seam between the dispatcher and whatever actually compiles.

use kiln_common::{Request, Response};
use kiln_lang::LanguageConfig;

use crate::error::CompileError;

/// Something that turns a request into a response: the local executor, the
/// remote client, or a test double.
///
/// Compiler-level failures must be returned as `Ok(Response::failure(..))`;
/// `Err` is reserved for failures of the call itself.
pub trait Backend: Send + Sync {
    /// Compiles `request` for `language`.
    fn compile(&self, request: &Request, language: &LanguageConfig)
        -> Result<Response, CompileError>;
}
