//! Shared foundational types used across the kiln compile pipeline.
//!
//! This crate provides content-derived hash identities, the request/response
//! types exchanged between the dispatcher, the local executor and remote
//! compile services, and a cooperative cancellation flag.

#![warn(missing_docs)]

pub mod cancel;
pub mod hash;
pub mod protocol;

pub use cancel::CancelFlag;
pub use hash::{HashIdentity, InvalidIdentity};
pub use protocol::{IncludedFile, IncludesMap, Request, Response, ResponseItem};
