//! JSON and JSON Lines reader.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]` (or a single object)
//! - Newline-delimited JSON: `{"a":1}\n{"a":2}\n`
//!
//! Headers are structural: the union of keys in first-seen order. Nested objects flatten into dot
//! paths (`user.name`) when [`ConvertConfig::flatten_nested`] is set; arrays stay as JSON text.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::types::Value;

use super::infer::{RawCell, RawTable};

/// Read a JSON document (array of objects or single object).
///
/// Input that is not a single JSON document is read as JSON Lines instead.
pub fn read_json(input: &str, config: &ConvertConfig) -> ConvertResult<RawTable> {
    let trimmed = input.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(RawTable::default());
    }

    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(JsonValue::Array(items)) => records_to_raw(items.into_iter().enumerate(), config),
        Ok(v @ JsonValue::Object(_)) => records_to_raw(std::iter::once((0, v)), config),
        Ok(_) => Err(ConvertError::parse(
            "json must be an object or an array of objects",
        )),
        Err(_) => read_json_lines(input, config),
    }
}

/// Read newline-delimited JSON objects. Blank lines are skipped and do not count as rows.
pub fn read_json_lines(input: &str, config: &ConvertConfig) -> ConvertResult<RawTable> {
    let input = input.trim_start_matches('\u{feff}');
    let mut values = Vec::new();
    for (line_idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = values.len();
        let v = serde_json::from_str::<JsonValue>(line).map_err(|e| {
            ConvertError::parse_at(row, None, format!("invalid json at line {}: {e}", line_idx + 1))
        })?;
        values.push((row, v));
    }
    records_to_raw(values.into_iter(), config)
}

fn records_to_raw(
    records: impl Iterator<Item = (usize, JsonValue)>,
    config: &ConvertConfig,
) -> ConvertResult<RawTable> {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, RawCell)>> = Vec::new();

    for (row, v) in records {
        let JsonValue::Object(obj) = v else {
            return Err(ConvertError::parse_at(row, None, "record is not a json object"));
        };

        let mut flat = Vec::with_capacity(obj.len());
        flatten_into(&mut flat, String::new(), obj, config.flatten_nested);

        let mut cells = Vec::with_capacity(flat.len());
        for (key, cell) in flat {
            let col = match index.get(&key) {
                Some(&c) if cells.iter().any(|(seen, _)| *seen == c) => {
                    return Err(ConvertError::parse_at(
                        row,
                        Some(&key),
                        format!("duplicate column '{key}' after flattening"),
                    ));
                }
                Some(&c) => c,
                None => {
                    let c = names.len();
                    index.insert(key.clone(), c);
                    names.push(key);
                    c
                }
            };
            cells.push((col, cell));
        }
        sparse_rows.push(cells);
    }

    let width = names.len();
    let mut raw = RawTable::new(names);
    raw.rows = sparse_rows
        .into_iter()
        .map(|cells| {
            let mut row = vec![RawCell::Missing; width];
            for (col, cell) in cells {
                row[col] = cell;
            }
            row
        })
        .collect();
    Ok(raw)
}

fn flatten_into(
    out: &mut Vec<(String, RawCell)>,
    prefix: String,
    obj: Map<String, JsonValue>,
    flatten_nested: bool,
) {
    for (key, v) in obj {
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match v {
            JsonValue::Object(inner) if flatten_nested && !inner.is_empty() => {
                flatten_into(out, name, inner, flatten_nested)
            }
            other => out.push((name, json_cell(other))),
        }
    }
}

fn json_cell(v: JsonValue) -> RawCell {
    match v {
        JsonValue::Null => RawCell::Typed(Value::Null),
        JsonValue::Bool(b) => RawCell::Typed(Value::Bool(b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => RawCell::Typed(Value::Int64(i)),
            None => RawCell::Typed(n.as_f64().map(Value::Float64).unwrap_or(Value::Null)),
        },
        JsonValue::String(s) => RawCell::Typed(Value::Utf8(s)),
        other @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
            RawCell::Typed(Value::Utf8(other.to_string()))
        }
    }
}
