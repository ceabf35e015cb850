//! Content-addressed compile artifact cache.
//!
//! Each resolved source unit owns one directory named by its
//! [`HashIdentity`](kiln_common::HashIdentity), holding an `<object>-bin` and
//! an `<object>-abi` file per declared object. Entries are written once and
//! never modified: changed source produces a new identity and a new
//! directory, so concurrent writers can only ever write identical bytes.

#![warn(missing_docs)]

pub mod error;
pub mod store;

pub use error::CacheError;
pub use store::{declared_view, CacheStore, WriteSummary};
