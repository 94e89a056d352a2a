//! Conversion entrypoints and format readers.
//!
//! Most callers should use [`convert`] (from [`unified`]) which:
//!
//! - detects the format by extension, then by content (or uses [`ConvertOptions::format`])
//! - parses the file into a raw grid and infers/validates column types ([`infer`])
//! - optionally reports success/failure/alerts to a [`ConvertObserver`]
//!
//! Format readers live under [`delimited`], [`json`] and [`parquet`]; detection under [`format`].

pub mod delimited;
pub mod format;
pub mod infer;
pub mod json;
pub mod observability;
pub mod parquet;
pub mod unified;

pub use format::{detect_format, sniff, sniff_window, Format, FormatHint};
pub use infer::{classify_text, unify};
pub use observability::{
    CompositeObserver, ConvertContext, ConvertObserver, ConvertSeverity, ConvertStats, FileObserver,
    StdErrObserver, TracingObserver,
};
pub use unified::{convert, convert_bytes, convert_path, convert_str, ConvertOptions, ConvertRequest};
