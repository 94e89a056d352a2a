//! Per-column type inference and schema validation.
//!
//! Format readers produce a [`RawTable`]: header names plus cells that are either untyped text
//! (delimited formats) or already tagged values (JSON, Parquet). [`build_table`] then:
//!
//! 1. tags every cell ([`classify_text`] for text cells),
//! 2. folds the tags of each column with [`unify`] until the fold reaches its fixed point,
//! 3. materializes each cell as the column type.
//!
//! Columns named by a caller-provided [`Schema`] skip inference and are coerced to the declared
//! type instead.

use std::collections::HashSet;

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::types::{Column, DataType, Field, Schema, Table, Value};

/// A cell as produced by a format reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Absent from the record (e.g. a JSON key missing on one row).
    Missing,
    /// Untyped text to be classified.
    Text(String),
    /// A value the source format already typed.
    Typed(Value),
}

static MISSING: RawCell = RawCell::Missing;

/// Header names plus row-major raw cells. Every row has `names.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: Vec::new(),
        }
    }

    /// Fail with a parse error if a header name repeats.
    pub fn check_unique_names(&self) -> ConvertResult<()> {
        let mut seen = HashSet::with_capacity(self.names.len());
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(ConvertError::ParseError {
                    path: None,
                    row: None,
                    column: Some(name.clone()),
                    message: format!("duplicate column name '{name}'"),
                });
            }
        }
        Ok(())
    }
}

/// Join of two column types. `Null` is the identity and `Utf8` is the top.
pub fn unify(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (DataType::Null, x) | (x, DataType::Null) => x,
        (x, y) if x == y => x,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

/// Tag a single text cell.
///
/// Integer literals (optional sign, digits only) that fit in `i64` are integers; decimal or
/// exponent literals, `NaN` and `inf` are floats. `1.0` is therefore a float.
pub fn classify_text(raw: &str, config: &ConvertConfig) -> Value {
    let s = if config.trim_whitespace { raw.trim() } else { raw };
    if config.is_null_token(s.trim()) {
        return Value::Null;
    }
    if config.infer_booleans {
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
    }
    if is_integer_literal(s) {
        return match s.parse::<i64>() {
            Ok(v) => Value::Int64(v),
            // Overflowing integers keep their magnitude as floats.
            Err(_) => s
                .parse::<f64>()
                .map(Value::Float64)
                .unwrap_or_else(|_| Value::Utf8(s.to_owned())),
        };
    }
    if let Some(v) = parse_float_literal(s) {
        return Value::Float64(v);
    }
    Value::Utf8(s.to_owned())
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_float_literal(s: &str) -> Option<f64> {
    match s {
        "NaN" | "nan" => return Some(f64::NAN),
        "inf" | "+inf" | "Infinity" => return Some(f64::INFINITY),
        "-inf" | "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // Rust also accepts words like "infinity"; require a digit so text stays text.
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok()
}

fn tag_cell(cell: &RawCell, config: &ConvertConfig) -> Value {
    match cell {
        RawCell::Missing => Value::Null,
        RawCell::Text(s) => classify_text(s, config),
        RawCell::Typed(Value::Utf8(s)) if s.is_empty() => Value::Null,
        RawCell::Typed(v) => v.clone(),
    }
}

/// Infer the type of one column.
pub fn infer_column_type<'a>(
    cells: impl IntoIterator<Item = &'a RawCell>,
    config: &ConvertConfig,
) -> DataType {
    let mut acc = DataType::Null;
    for cell in cells {
        acc = unify(acc, tag_cell(cell, config).data_type());
        if acc == DataType::Utf8 {
            break;
        }
    }
    acc
}

/// Materialize a single cell as the inferred column type.
fn materialize(cell: &RawCell, data_type: DataType, config: &ConvertConfig) -> Value {
    let tagged = tag_cell(cell, config);
    match (tagged, data_type) {
        (Value::Null, _) => Value::Null,
        (Value::Int64(v), DataType::Float64) => Value::Float64(v as f64),
        (v, DataType::Utf8) if v.data_type() != DataType::Utf8 => match cell {
            RawCell::Text(s) if config.trim_whitespace => Value::Utf8(s.trim().to_owned()),
            RawCell::Text(s) => Value::Utf8(s.clone()),
            _ => Value::Utf8(v.to_string()),
        },
        (v, _) => v,
    }
}

/// Build a [`Table`] from a raw grid, inferring undeclared columns and validating declared ones.
pub fn build_table(
    raw: RawTable,
    schema: Option<&Schema>,
    config: &ConvertConfig,
) -> ConvertResult<Table> {
    raw.check_unique_names()?;

    if let Some(schema) = schema {
        for field in &schema.fields {
            if !raw.names.iter().any(|n| n == &field.name) {
                return Err(ConvertError::ParseError {
                    path: None,
                    row: None,
                    column: Some(field.name.clone()),
                    message: format!(
                        "missing declared column '{}'. headers={:?}",
                        field.name, raw.names
                    ),
                });
            }
        }
    }

    let RawTable { names, rows } = raw;
    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.into_iter().enumerate() {
        let cells = rows.iter().map(|r| r.get(idx).unwrap_or(&MISSING));
        let column = match schema.and_then(|s| s.field(&name)) {
            Some(field) => coerce_column(field, cells, config)?,
            None => {
                let data_type = infer_column_type(cells.clone(), config);
                let values = cells.map(|c| materialize(c, data_type, config)).collect();
                Column::new(name, data_type, values)
            }
        };
        columns.push(column);
    }

    Table::new(columns).map_err(|e| ConvertError::parse(e.to_string()))
}

fn coerce_column<'a>(
    field: &Field,
    cells: impl Iterator<Item = &'a RawCell>,
    config: &ConvertConfig,
) -> ConvertResult<Column> {
    let mut values = Vec::new();
    for (row, cell) in cells.enumerate() {
        let value = match coerce_cell(cell, field.data_type, config) {
            Ok(v) => v,
            Err(message) if config.strict_types => {
                return Err(ConvertError::parse_at(row, Some(&field.name), message));
            }
            Err(_) => Value::Null,
        };
        if value.is_null() && !field.nullable {
            return Err(ConvertError::parse_at(
                row,
                Some(&field.name),
                "null value in non-nullable column",
            ));
        }
        values.push(value);
    }
    Ok(Column::new(field.name.clone(), field.data_type, values))
}

fn coerce_cell(cell: &RawCell, data_type: DataType, config: &ConvertConfig) -> Result<Value, String> {
    match cell {
        RawCell::Missing => Ok(Value::Null),
        RawCell::Text(raw) => parse_typed_text(raw, data_type, config),
        RawCell::Typed(v) => coerce_value(v, data_type, config),
    }
}

fn parse_typed_text(raw: &str, data_type: DataType, config: &ConvertConfig) -> Result<Value, String> {
    let trimmed = raw.trim();
    if config.is_null_token(trimmed) {
        return Ok(Value::Null);
    }
    let text = if config.trim_whitespace { trimmed } else { raw };

    match data_type {
        DataType::Null => Err(format!("expected null, found '{raw}'")),
        DataType::Utf8 => Ok(Value::Utf8(text.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| format!("expected integer, found '{raw}': {e}")),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| format!("expected number, found '{raw}': {e}")),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
    }
}

fn coerce_value(v: &Value, data_type: DataType, config: &ConvertConfig) -> Result<Value, String> {
    match (v, data_type) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::Utf8(s), DataType::Utf8) if s.is_empty() => Ok(Value::Null),
        (Value::Utf8(s), _) => parse_typed_text(s, data_type, config),
        (v, t) if v.data_type() == t => Ok(v.clone()),
        (Value::Int64(i), DataType::Float64) => Ok(Value::Float64(*i as f64)),
        (Value::Float64(f), DataType::Int64)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            Ok(Value::Int64(*f as i64))
        }
        (v, DataType::Utf8) => Ok(Value::Utf8(v.to_string())),
        (v, t) => Err(format!("expected {t}, found {} value {v}", v.data_type())),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err(format!("expected bool (true/false/1/0/yes/no), found '{s}'")),
    }
}
