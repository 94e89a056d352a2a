use std::io::Write;
use std::sync::Arc;

use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;

use crate::error::{ConvertError, ConvertResult};
use crate::types::{Column, DataType, Table, Value};

/// Write `table` as a single-row-group Parquet file.
///
/// Every column is OPTIONAL. `Null`-typed and `Utf8` columns are UTF8 byte arrays.
pub fn write_parquet<W: Write + Send>(writer: W, table: &Table) -> ConvertResult<()> {
    if table.column_count() == 0 {
        return Err(ConvertError::export("parquet requires at least one column"));
    }

    let schema = Arc::new(parquet_schema(table)?);
    let props = Arc::new(WriterProperties::builder().build());
    let mut writer = SerializedFileWriter::new(writer, schema, props).map_err(export_error)?;

    let mut rg = writer.next_row_group().map_err(export_error)?;
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column().map_err(export_error)? {
        let column = table
            .columns()
            .get(col_idx)
            .ok_or_else(|| ConvertError::export("parquet writer requested an unknown column"))?;
        let defs = definition_levels(column);

        match col.untyped() {
            ColumnWriter::Int64ColumnWriter(w) => {
                let vals: Vec<i64> = column.values.iter().filter_map(Value::as_i64).collect();
                w.write_batch(&vals, Some(&defs), None)
                    .map_err(export_error)?;
            }
            ColumnWriter::DoubleColumnWriter(w) => {
                let vals: Vec<f64> = column.values.iter().filter_map(Value::as_f64).collect();
                w.write_batch(&vals, Some(&defs), None)
                    .map_err(export_error)?;
            }
            ColumnWriter::BoolColumnWriter(w) => {
                let vals: Vec<bool> = column.values.iter().filter_map(Value::as_bool).collect();
                w.write_batch(&vals, Some(&defs), None)
                    .map_err(export_error)?;
            }
            ColumnWriter::ByteArrayColumnWriter(w) => {
                let vals: Vec<ByteArray> = column
                    .values
                    .iter()
                    .filter_map(|v| v.as_str().map(ByteArray::from))
                    .collect();
                w.write_batch(&vals, Some(&defs), None)
                    .map_err(export_error)?;
            }
            _ => {
                return Err(ConvertError::export(format!(
                    "unexpected parquet column writer for '{}'",
                    column.name
                )));
            }
        }
        col.close().map_err(export_error)?;
        col_idx += 1;
    }
    rg.close().map_err(export_error)?;
    writer.close().map_err(export_error)?;
    Ok(())
}

fn parquet_schema(table: &Table) -> ConvertResult<Type> {
    let mut fields = Vec::with_capacity(table.column_count());
    for column in table.columns() {
        let (physical, converted) = match column.data_type {
            DataType::Int64 => (PhysicalType::INT64, ConvertedType::NONE),
            DataType::Float64 => (PhysicalType::DOUBLE, ConvertedType::NONE),
            DataType::Bool => (PhysicalType::BOOLEAN, ConvertedType::NONE),
            DataType::Utf8 | DataType::Null => (PhysicalType::BYTE_ARRAY, ConvertedType::UTF8),
        };
        let field = Type::primitive_type_builder(&column.name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .with_converted_type(converted)
            .build()
            .map_err(export_error)?;
        fields.push(Arc::new(field));
    }
    Type::group_type_builder("schema")
        .with_fields(fields)
        .build()
        .map_err(export_error)
}

fn export_error(e: ParquetError) -> ConvertError {
    ConvertError::export(format!("parquet: {e}"))
}

fn definition_levels(column: &Column) -> Vec<i16> {
    column
        .values
        .iter()
        .map(|v| if v.is_null() { 0 } else { 1 })
        .collect()
}
