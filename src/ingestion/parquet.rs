//! Parquet reader.

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

use crate::error::ConvertResult;
use crate::types::Value;

use super::infer::{RawCell, RawTable};

/// Read an in-memory Parquet file into a raw grid.
///
/// Headers are the top-level fields of the file schema. Values keep their physical types;
/// logical types without a [`Value`] counterpart (dates, decimals, groups, ...) become text.
pub fn read_parquet(data: Bytes) -> ConvertResult<RawTable> {
    let reader = SerializedFileReader::new(data)?;

    let names: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_owned())
        .collect();

    let mut raw = RawTable::new(names);
    for row_res in reader.get_row_iter(None)? {
        let row = row_res?;
        let mut cells = vec![RawCell::Missing; raw.names.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(idx) = raw.names.iter().position(|n| n == name) {
                cells[idx] = parquet_cell(field);
            }
        }
        raw.rows.push(cells);
    }

    Ok(raw)
}

fn parquet_cell(f: &Field) -> RawCell {
    let v = match f {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(*b),
        Field::Byte(v) => Value::Int64(i64::from(*v)),
        Field::Short(v) => Value::Int64(i64::from(*v)),
        Field::Int(v) => Value::Int64(i64::from(*v)),
        Field::Long(v) => Value::Int64(*v),
        Field::UByte(v) => Value::Int64(i64::from(*v)),
        Field::UShort(v) => Value::Int64(i64::from(*v)),
        Field::UInt(v) => Value::Int64(i64::from(*v)),
        Field::ULong(v) => match i64::try_from(*v) {
            Ok(i) => Value::Int64(i),
            Err(_) => Value::Float64(*v as f64),
        },
        Field::Float(v) => Value::Float64(f64::from(*v)),
        Field::Double(v) => Value::Float64(*v),
        Field::Str(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    };
    RawCell::Typed(v)
}
