//! Content hashing for cache keys and include references.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// The identity of a fully include-resolved source unit.
///
/// Rendered as `<sha256-hex>.<extension>`. The same text serves as the cache
/// directory name and as the path written into a parent's include statement,
/// so identical resolved content always maps to the same identity no matter
/// where it was read from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashIdentity(String);

/// Error returned when a string is not a well-formed [`HashIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hash identity '{0}'")]
pub struct InvalidIdentity(pub String);

impl HashIdentity {
    /// Computes the identity of `data` for a language with extension `ext`.
    pub fn from_source(data: &[u8], ext: &str) -> Self {
        let digest = Sha256::digest(data);
        Self(format!("{}.{ext}", hex::encode(digest)))
    }

    /// Parses and validates an identity received from an untrusted peer.
    ///
    /// Identities become directory and file names, so anything other than a
    /// 64-char lowercase hex digest followed by an alphanumeric extension is
    /// rejected.
    pub fn parse(s: &str) -> Result<Self, InvalidIdentity> {
        let invalid = || InvalidIdentity(s.to_string());
        let (digest, ext) = s.split_once('.').ok_or_else(invalid)?;
        let digest_ok = digest.len() == DIGEST_HEX_LEN
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        let ext_ok = !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric());
        if digest_ok && ext_ok {
            Ok(Self(s.to_string()))
        } else {
            Err(invalid())
        }
    }

    /// Returns the full `<digest>.<ext>` text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hex digest without the extension.
    pub fn digest(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(d, _)| d)
    }

    /// Returns the language extension suffix.
    pub fn extension(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, e)| e)
    }
}

impl TryFrom<String> for HashIdentity {
    type Error = InvalidIdentity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HashIdentity> for String {
    fn from(id: HashIdentity) -> Self {
        id.0
    }
}

impl AsRef<str> for HashIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for HashIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.digest().get(..8).unwrap_or_default();
        write!(f, "HashIdentity({short}..{})", self.extension())
    }
}
