//! Compile dispatch: cache check, local or remote compilation, cache write.
//!
//! [`Dispatcher::compile`] is the single entry point. A request whose whole
//! include graph is cached is answered from disk without touching a compiler
//! or the network; otherwise it goes to the [`LocalExecutor`] or, when the
//! language has a remote URL, to the [`RemoteClient`]. Both return the same
//! [`Response`](kiln_common::Response) shape, with compiler failures carried
//! in its `error` field rather than as a [`CompileError`].

#![warn(missing_docs)]

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod local;
pub mod remote;
pub mod request;
pub mod service;

pub use backend::Backend;
pub use dispatcher::Dispatcher;
pub use error::CompileError;
pub use local::LocalExecutor;
pub use remote::RemoteClient;
pub use request::{build_literal_request, build_request, verify_identities, RequestOptions};
pub use service::{handle_compile, ServiceReply};
