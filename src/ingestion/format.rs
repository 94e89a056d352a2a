//! Format tags and deterministic format detection.
//!
//! Detection is a pure function of `(extension, leading bytes)`:
//!
//! 1. A recognized extension wins.
//! 2. Otherwise the leading bytes are sniffed (Parquet magic, JSON markers, delimiter counts).
//! 3. Otherwise detection fails.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

const PARQUET_MAGIC: &[u8] = b"PAR1";

/// Delimiters considered by sniffing, in tie-break order.
const SNIFF_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Supported input/output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Delimited text with a header row (CSV, TSV, ...).
    Delimited { delimiter: u8 },
    /// One JSON object per line.
    JsonLines,
    /// A JSON array of objects, or a single object.
    Json,
    /// Apache Parquet.
    Parquet,
}

impl Format {
    pub const CSV: Self = Self::Delimited { delimiter: b',' };
    pub const TSV: Self = Self::Delimited { delimiter: b'\t' };
    pub const PSV: Self = Self::Delimited { delimiter: b'|' };

    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::CSV),
            "tsv" | "tab" => Some(Self::TSV),
            "psv" => Some(Self::PSV),
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            "json" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    /// Canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Delimited { delimiter: b'\t' } => "tsv",
            Self::Delimited { delimiter: b'|' } => "psv",
            Self::Delimited { .. } => "csv",
            Self::JsonLines => "jsonl",
            Self::Json => "json",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited { delimiter } => {
                write!(f, "delimited({:?})", char::from(*delimiter))
            }
            Self::JsonLines => f.write_str("jsonl"),
            Self::Json => f.write_str("json"),
            Self::Parquet => f.write_str("parquet"),
        }
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim())
            .ok_or_else(|| ConvertError::unsupported(format!("unknown format name '{s}'")))
    }
}

/// Caller-supplied format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatHint {
    /// Detect from extension, then content.
    #[default]
    Auto,
    /// Use this format without detection.
    Declared(Format),
}

impl From<Format> for FormatHint {
    fn from(f: Format) -> Self {
        Self::Declared(f)
    }
}

impl FromStr for FormatHint {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse().map(Self::Declared)
    }
}

/// Detect a format from an optional extension and the file's leading bytes.
///
/// A recognized extension always takes precedence over content.
pub fn detect_format(extension: Option<&str>, leading: &[u8]) -> Option<Format> {
    extension
        .and_then(Format::from_extension)
        .or_else(|| sniff(leading))
}

/// Extension of `path` as UTF-8, if any.
pub fn path_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

/// The first `window` bytes of `data`. When `data` is longer, the prefix is cut back to its last
/// complete line so a truncated record does not skew sniffing.
pub fn sniff_window(data: &[u8], window: usize) -> &[u8] {
    if data.len() <= window {
        return data;
    }
    let prefix = &data[..window];
    match prefix.iter().rposition(|&b| b == b'\n') {
        Some(end) => &prefix[..=end],
        None => prefix,
    }
}

/// Guess a format from content alone.
pub fn sniff(leading: &[u8]) -> Option<Format> {
    if leading.starts_with(PARQUET_MAGIC) {
        return Some(Format::Parquet);
    }
    if leading.contains(&0) {
        return None;
    }

    let text = leading_text(leading)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = text.trim_start();

    if body.starts_with('[') {
        return Some(Format::Json);
    }
    if body.starts_with('{') {
        let first_line = body.lines().next().unwrap_or("");
        return if serde_json::from_str::<serde_json::Value>(first_line).is_ok() {
            Some(Format::JsonLines)
        } else {
            Some(Format::Json)
        };
    }

    sniff_delimiter(body).map(|delimiter| Format::Delimited { delimiter })
}

/// Decode `leading` as UTF-8, tolerating a multi-byte sequence cut off by the sniff window.
fn leading_text(leading: &[u8]) -> Option<&str> {
    match std::str::from_utf8(leading) {
        Ok(s) => Some(s),
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&leading[..e.valid_up_to()]).ok(),
        Err(_) => None,
    }
}

/// Pick the candidate delimiter that splits the first two records into the same number of
/// fields (at least two). More fields wins; ties go to the earlier candidate.
fn sniff_delimiter(text: &str) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for d in SNIFF_DELIMITERS {
        let Some(n) = consistent_field_count(text, d) else {
            continue;
        };
        match best {
            Some((_, best_n)) if best_n >= n => {}
            _ => best = Some((d, n)),
        }
    }
    best.map(|(d, _)| d)
}

/// Field count shared by the first two records under `delimiter`, honoring quotes.
fn consistent_field_count(text: &str, delimiter: u8) -> Option<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = rdr.records();

    let first = records.next()?.ok()?;
    if first.len() < 2 {
        return None;
    }
    match records.next() {
        None => Some(first.len()),
        Some(Ok(second)) if second.len() == first.len() => Some(first.len()),
        Some(_) => None,
    }
}
