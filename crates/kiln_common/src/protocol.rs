//! Compile request and response types.
//!
//! These are the shapes exchanged between the dispatcher, the local executor
//! and a remote compile service. Field names on the wire follow the JSON
//! protocol (`name`, `objectNames`, `objectname`, ...); script bytes are
//! base64 encoded.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::hash::HashIdentity;

/// Every source unit of one include graph, keyed by identity.
///
/// Ordered by identity so that request bodies and command lines are
/// deterministic.
pub type IncludesMap = BTreeMap<HashIdentity, IncludedFile>;

/// One resolved source unit of an include graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedFile {
    /// Contract/library names declared by this unit.
    #[serde(rename = "objectNames", default, deserialize_with = "nullable_vec")]
    pub object_names: Vec<String>,

    /// The unit's source with its own includes already rewritten.
    #[serde(with = "script_bytes")]
    pub script: Vec<u8>,
}

/// A compile request for one top-level script and everything it includes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Display name of the top-level script.
    #[serde(rename = "name", default)]
    pub script_name: String,

    /// Language registry key (`sol`, `se`, `lll`).
    pub language: String,

    /// The full include graph, including the top-level file itself.
    pub includes: IncludesMap,

    /// Library addresses as `name:address` pairs separated by commas.
    #[serde(default)]
    pub libraries: String,

    /// Whether to pass the language's optimize flag.
    #[serde(default)]
    pub optimize: bool,

    /// Maps identity file names back to the paths they came from, for
    /// rewriting compiler error messages.
    #[serde(rename = "replacement", default, deserialize_with = "nullable_map")]
    pub file_replacement: BTreeMap<String, String>,

    /// Identity of the top-level script, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<HashIdentity>,
}

/// One compiled object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseItem {
    /// Contract or library name.
    #[serde(rename = "objectname")]
    pub object_name: String,

    /// Hex-encoded bytecode.
    #[serde(default)]
    pub bytecode: String,

    /// JSON-encoded ABI.
    #[serde(default)]
    pub abi: String,
}

/// The result of a compile request.
///
/// A compiler-level failure is represented by a non-empty `error` with no
/// objects, never by a transport error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Compiled objects, one per declared contract/library.
    #[serde(default, deserialize_with = "nullable_vec")]
    pub objects: Vec<ResponseItem>,

    /// Compiler error text; empty on success.
    #[serde(default)]
    pub error: String,
}

impl Response {
    /// Builds a successful response from compiled objects.
    pub fn success(objects: Vec<ResponseItem>) -> Self {
        Self {
            objects,
            error: String::new(),
        }
    }

    /// Builds a failed response carrying the compiler's error text.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            objects: Vec::new(),
            error: error.into(),
        }
    }

    /// Returns `true` if the compiler reported an error.
    pub fn is_failure(&self) -> bool {
        !self.error.is_empty()
    }

    /// Looks up a compiled object by name.
    pub fn object(&self, name: &str) -> Option<&ResponseItem> {
        self.objects.iter().find(|o| o.object_name == name)
    }
}

/// Accepts `null` where a list is expected, as Go peers encode empty slices.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

mod script_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(text.as_bytes()).map_err(de::Error::custom)
    }
}
