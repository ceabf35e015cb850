//! Sending requests to a remote compile service.
//!
//! The request is posted as JSON to the language's configured URL. Only a
//! 2xx answer is decoded; everything else is a transport failure and never
//! reaches the cache.

use std::error::Error as _;
use std::io;
use std::time::Duration;

use kiln_common::{Request, Response};
use kiln_lang::LanguageConfig;

use crate::backend::Backend;
use crate::error::CompileError;

/// Blocking JSON-over-HTTP client for a compile service.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    agent: ureq::Agent,
    timeout: Duration,
}

impl RemoteClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, timeout }
    }

    /// The per-request deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts `request` to `url` and decodes the answer.
    pub fn send(&self, url: &str, request: &Request) -> Result<Response, CompileError> {
        let body = serde_json::to_string(request)
            .map_err(|e| CompileError::Decode(format!("failed to encode request: {e}")))?;

        tracing::info!(
            url,
            language = %request.language,
            units = request.includes.len(),
            "sending compile request"
        );

        let reply = match self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(reply) => reply,
            Err(ureq::Error::Status(code, reply)) => {
                let detail = reply.into_string().unwrap_or_default();
                let detail = detail.trim();
                let reason = if detail.is_empty() {
                    format!("HTTP status {code}")
                } else {
                    format!("HTTP status {code}: {detail}")
                };
                return Err(CompileError::Transport {
                    url: url.to_string(),
                    status: Some(code),
                    reason,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(if is_timeout(&transport) {
                    self.timed_out(url)
                } else {
                    CompileError::Transport {
                        url: url.to_string(),
                        status: None,
                        reason: transport.to_string(),
                    }
                });
            }
        };

        let text = reply.into_string().map_err(|e| {
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                self.timed_out(url)
            } else {
                CompileError::Transport {
                    url: url.to_string(),
                    status: None,
                    reason: e.to_string(),
                }
            }
        })?;

        serde_json::from_str(&text)
            .map_err(|e| CompileError::Decode(format!("invalid response from {url}: {e}")))
    }

    fn timed_out(&self, url: &str) -> CompileError {
        CompileError::Timeout {
            url: url.to_string(),
            timeout: self.timeout,
        }
    }
}

impl Backend for RemoteClient {
    fn compile(
        &self,
        request: &Request,
        language: &LanguageConfig,
    ) -> Result<Response, CompileError> {
        let url = language.remote_url.as_deref().ok_or_else(|| CompileError::Transport {
            url: String::new(),
            status: None,
            reason: format!("no remote URL configured for {}", language.key),
        })?;
        self.send(url, request)
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = transport.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = err.source();
    }
    transport.to_string().contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_backend_requires_url() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = kiln_lang::Registry::with_defaults(tmp.path()).unwrap();
        let lang = registry.get("sol").unwrap();
        let req = Request {
            script_name: "x.sol".to_string(),
            language: "sol".to_string(),
            includes: Default::default(),
            libraries: String::new(),
            optimize: false,
            file_replacement: Default::default(),
            entry: None,
        };
        let err = RemoteClient::new(Duration::from_secs(1))
            .compile(&req, lang)
            .unwrap_err();
        assert!(matches!(err, CompileError::Transport { status: None, .. }));
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        // Port 9 on loopback is almost never listening.
        let client = RemoteClient::new(Duration::from_secs(2));
        let req = Request {
            script_name: "x.lll".to_string(),
            language: "lll".to_string(),
            includes: Default::default(),
            libraries: String::new(),
            optimize: false,
            file_replacement: Default::default(),
            entry: None,
        };
        let err = client.send("http://127.0.0.1:9/compile", &req).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Transport { .. } | CompileError::Timeout { .. }
        ));
    }
}
