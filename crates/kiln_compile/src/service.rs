//! Server-side handling of a posted compile request.
//!
//! Transport-agnostic: the caller supplies the body bytes and writes back
//! the returned status and body with whatever HTTP stack it runs.

use kiln_common::{Request, Response};

use crate::dispatcher::Dispatcher;
use crate::request::verify_identities;

/// Status and JSON body to send back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    /// HTTP status code.
    pub status: u16,
    /// Serialized [`Response`].
    pub body: Vec<u8>,
}

impl ServiceReply {
    fn json(status: u16, response: &Response) -> Self {
        // Response holds only strings and lists; encoding cannot fail.
        let body = serde_json::to_vec(response).unwrap_or_default();
        Self { status, body }
    }
}

/// Decodes `body` as a [`Request`], compiles it locally, and encodes the
/// answer.
///
/// Every unit must be keyed by the identity of its own script; anything else
/// is refused before it can reach the cache. A compiler rejecting the source
/// is a 200 with the `error` field set; an undecodable body, a mismatched
/// identity or any failure of the compile call itself is a 500.
pub fn handle_compile(dispatcher: &Dispatcher<'_>, body: &[u8]) -> ServiceReply {
    let request: Request = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed compile request");
            return ServiceReply::json(500, &Response::failure(format!("malformed request: {e}")));
        }
    };

    tracing::info!(
        script = %request.script_name,
        language = %request.language,
        units = request.includes.len(),
        "serving compile request"
    );

    match verify_identities(&request).and_then(|()| dispatcher.compile_locally(&request)) {
        Ok(response) => ServiceReply::json(200, &response),
        Err(e) => {
            tracing::warn!(error = %e, "compile request failed");
            ServiceReply::json(500, &Response::failure(e.to_string()))
        }
    }
}
