//! Decoders from native compiler output to response items.

use std::collections::BTreeMap;

use kiln_common::ResponseItem;
use serde::Deserialize;

use crate::error::LanguageError;

/// The shape of an external compiler's successful output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `solc --combined-json bin,abi`: a JSON object keyed by contract name.
    /// The compiler is handed every unit of the include graph.
    CombinedJson,
    /// A single hex bytecode blob with no ABI. Only the top-level unit is
    /// passed on the command line; includes are resolved from the working
    /// directory.
    HexBlob,
}

/// Top-level `--combined-json` document.
#[derive(Debug, Deserialize)]
struct CombinedOutput {
    #[serde(default)]
    contracts: BTreeMap<String, CombinedContract>,
}

/// One contract entry in a `--combined-json` document.
#[derive(Debug, Deserialize)]
struct CombinedContract {
    #[serde(default)]
    bin: String,
    /// Older compilers emit the ABI as a JSON string, newer ones inline it.
    #[serde(default)]
    abi: serde_json::Value,
}

impl OutputFormat {
    /// Returns `true` if every included unit goes on the command line.
    pub fn takes_all_units(self) -> bool {
        matches!(self, Self::CombinedJson)
    }

    /// Decodes trimmed compiler stdout into response items.
    ///
    /// `object_name` names the single item produced by blob-style output.
    pub fn decode(
        self,
        language: &str,
        output: &str,
        object_name: &str,
    ) -> Result<Vec<ResponseItem>, LanguageError> {
        match self {
            Self::CombinedJson => decode_combined_json(language, output),
            Self::HexBlob => decode_hex_blob(language, output, object_name).map(|i| vec![i]),
        }
    }
}

fn decode_combined_json(language: &str, output: &str) -> Result<Vec<ResponseItem>, LanguageError> {
    let parsed: CombinedOutput =
        serde_json::from_str(output.trim()).map_err(|e| LanguageError::Decode {
            language: language.to_string(),
            reason: e.to_string(),
        })?;

    let items = parsed
        .contracts
        .into_iter()
        .map(|(key, contract)| {
            // Newer compilers key contracts as `<source path>:<name>`.
            let name = key.rsplit(':').next().unwrap_or(&key).trim().to_string();
            let abi = match contract.abi {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            ResponseItem {
                object_name: name,
                bytecode: contract.bin.trim().to_string(),
                abi,
            }
        })
        .collect();
    Ok(items)
}

fn decode_hex_blob(
    language: &str,
    output: &str,
    object_name: &str,
) -> Result<ResponseItem, LanguageError> {
    let trimmed = output.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(LanguageError::Decode {
            language: language.to_string(),
            reason: "compiler produced no bytecode".to_string(),
        });
    }
    hex::decode(digits).map_err(|e| LanguageError::Decode {
        language: language.to_string(),
        reason: format!("bytecode is not hex: {e}"),
    })?;
    Ok(ResponseItem {
        object_name: object_name.to_string(),
        bytecode: digits.to_ascii_lowercase(),
        abi: String::new(),
    })
}
