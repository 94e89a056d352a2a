//! Conversion configuration.
//!
//! [`ConvertConfig`] holds the plain-data knobs for parsing and type inference. Every field has a
//! default, so partial JSON documents are accepted by [`ConvertConfig::from_json_str`].

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};

/// Default number of leading bytes inspected when sniffing a format.
pub const DEFAULT_SNIFF_BYTES: usize = 8 * 1024;

/// Parsing and inference settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Text values that denote a missing cell (compared after trimming).
    pub null_tokens: Vec<String>,
    /// Trim surrounding whitespace from delimited cells.
    pub trim_whitespace: bool,
    /// Tag `true`/`false` text cells as booleans during inference.
    pub infer_booleans: bool,
    /// Fail on cells that do not parse as their declared schema type instead of nulling them.
    pub strict_types: bool,
    /// Leading bytes inspected by format sniffing.
    pub sniff_bytes: usize,
    /// Flatten nested JSON objects into dot-path columns (`user.name`).
    pub flatten_nested: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            null_tokens: ["", "NA", "N/A", "null", "NULL", "None"]
                .into_iter()
                .map(String::from)
                .collect(),
            trim_whitespace: true,
            infer_booleans: true,
            strict_types: false,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            flatten_nested: true,
        }
    }
}

impl ConvertConfig {
    /// Load a config from JSON text. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> ConvertResult<Self> {
        serde_json::from_str(input).map_err(|e| ConvertError::parse(format!("invalid config: {e}")))
    }

    /// Whether `raw` (already trimmed) is a null token.
    pub fn is_null_token(&self, raw: &str) -> bool {
        raw.is_empty() || self.null_tokens.iter().any(|t| t == raw)
    }
}
