//! Serialize a [`Table`] back to a supported format.
//!
//! Export is the inverse of [`crate::ingestion::convert`]: converting an exported file yields a
//! table equal to the original, up to type-stable formatting (e.g. a Utf8 column whose values all
//! look like integers re-infers as Int64).
//!
//! ```rust
//! use tabular_ingest::export::write_delimited;
//! use tabular_ingest::ingestion::{convert_str, ConvertOptions, Format};
//!
//! let table = convert_str("a,b\n1,x\n2.5,\n", Format::CSV, &ConvertOptions::default()).unwrap();
//! let mut out = Vec::new();
//! write_delimited(&mut out, &table, b',').unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "a,b\n1.0,x\n2.5,\n");
//! ```

mod parquet;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use crate::error::{ConvertError, ConvertResult};
use crate::ingestion::Format;
use crate::types::Table;

pub use self::parquet::write_parquet;

/// Write `table` to `path` in `format`, creating or truncating the file.
pub fn write_table(path: impl AsRef<Path>, table: &Table, format: Format) -> ConvertResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ConvertError::io(e).with_path(path))?;

    let result = match format {
        Format::Parquet => write_parquet(file, table),
        other => {
            let mut w = BufWriter::new(file);
            let written = match other {
                Format::Delimited { delimiter } => write_delimited(&mut w, table, delimiter),
                Format::JsonLines => write_json_lines(&mut w, table),
                _ => write_json(&mut w, table),
            };
            written.and_then(|()| w.flush().map_err(ConvertError::io))
        }
    };
    result.map_err(|e| e.with_path(path))
}

/// Write a header row followed by one record per row. Nulls are written as empty fields.
pub fn write_delimited<W: Write>(writer: W, table: &Table, delimiter: u8) -> ConvertResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    if table.column_count() > 0 {
        wtr.write_record(table.column_names()).map_err(csv_error)?;
    }
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_error)?;
    }
    wtr.flush().map_err(ConvertError::io)?;
    Ok(())
}

/// Write one JSON object per line, keys in column order.
pub fn write_json_lines<W: Write>(mut writer: W, table: &Table) -> ConvertResult<()> {
    for obj in row_objects(table)? {
        serde_json::to_writer(&mut writer, &obj).map_err(json_error)?;
        writer.write_all(b"\n").map_err(ConvertError::io)?;
    }
    Ok(())
}

/// Write a pretty-printed JSON array of objects.
pub fn write_json<W: Write>(mut writer: W, table: &Table) -> ConvertResult<()> {
    let rows = row_objects(table)?;
    serde_json::to_writer_pretty(&mut writer, &rows).map_err(json_error)?;
    writer.write_all(b"\n").map_err(ConvertError::io)?;
    Ok(())
}

fn row_objects(table: &Table) -> ConvertResult<Vec<JsonValue>> {
    let names = table.column_names();
    table
        .rows()
        .map(|row| {
            let mut obj = Map::with_capacity(names.len());
            for (name, v) in names.iter().zip(row) {
                obj.insert((*name).to_owned(), serde_json::to_value(v).map_err(json_error)?);
            }
            Ok(JsonValue::Object(obj))
        })
        .collect()
}

fn csv_error(e: csv::Error) -> ConvertError {
    match e.into_kind() {
        csv::ErrorKind::Io(e) => ConvertError::io(e),
        other => ConvertError::export(format!("csv: {other:?}")),
    }
}

fn json_error(e: serde_json::Error) -> ConvertError {
    if e.is_io() {
        ConvertError::io(e.into())
    } else {
        ConvertError::export(format!("json: {e}"))
    }
}
