//! Recursive include resolution.
//!
//! Rewrites every include/import statement in a source unit to reference the
//! [`HashIdentity`](kiln_common::HashIdentity) of the fully resolved included
//! content, and collects the whole transitive include graph into an
//! [`IncludesMap`](kiln_common::IncludesMap) for cache checks and compilation.

#![warn(missing_docs)]

pub mod error;
pub mod resolver;

pub use error::ResolveError;
pub use resolver::{Resolution, Resolver};
