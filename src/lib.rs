//! `tabular-ingest` reads a file of unknown or declared format into a column-typed in-memory
//! [`types::Table`].
//!
//! The primary entrypoint is [`ingestion::convert`], which detects the format from the file
//! extension (falling back to sniffing the leading bytes), parses rows and columns, and infers a
//! type for every column. Force a format or declare column types via
//! [`ingestion::ConvertOptions`].
//!
//! ## Formats
//!
//! - **Delimited text**: `.csv`, `.tsv`/`.tab`, `.psv` (content sniffing also recognizes `;`)
//! - **JSON Lines**: `.jsonl`, `.ndjson`
//! - **JSON**: `.json` (array of objects or a single object)
//! - **Parquet**: `.parquet`, `.pq`
//!
//! ## Column types
//!
//! Each column is one of [`types::DataType::Int64`], [`types::DataType::Float64`],
//! [`types::DataType::Bool`], [`types::DataType::Utf8`] or [`types::DataType::Null`] (no non-null
//! values). Inference folds the tags of all cells in a column:
//!
//! - integers and floats unify to floats (any non-integral value promotes the column)
//! - any other mix unifies to text
//! - empty cells and null tokens (`NA`, `null`, ...) are nulls and never change the column type
//!
//! ## Quick example
//!
//! ```no_run
//! use tabular_ingest::ingestion::{convert, ConvertOptions};
//! use tabular_ingest::types::Value;
//!
//! # fn main() -> Result<(), tabular_ingest::ConvertError> {
//! let table = convert("people.csv", &ConvertOptions::default())?;
//! for row in table.rows() {
//!     if let Value::Utf8(name) = row[0] {
//!         println!("{name}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: conversion entrypoints, format detection, readers and type inference
//! - [`export`]: writers for the same formats
//! - [`types`]: table, column and schema types
//! - [`config`]: parsing and inference settings
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod types;

pub use error::{ConvertError, ConvertResult};
pub use ingestion::{convert, ConvertOptions, Format, FormatHint};
pub use types::Table;
