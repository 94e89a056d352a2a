//! Core data model types.
//!
//! Conversion produces a [`Table`]: an ordered list of named [`Column`]s, each holding a
//! homogeneous sequence of typed [`Value`]s. A [`Schema`] (a list of typed [`Field`]s) describes
//! a table's shape and can be supplied up front to validate declared columns.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Every cell is null (or the column has no rows).
    Null,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// UTF-8 string.
    Utf8,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "utf8",
        };
        f.write_str(s)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Whether nulls are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Field {
    /// Create a new nullable field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Create a field that rejects nulls.
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, data_type)
        }
    }
}

/// A list of fields describing the shape of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns a field by name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single typed value in a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// The type tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload of a [`Value::Int64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// The numeric payload as a float; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            Self::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The payload of a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Text form used by delimited export and by Utf8 coercion.
///
/// Floats always carry a fractional part or exponent (`1.0`, not `1`) so they re-infer as floats.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float64(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "inf" } else { "-inf" })
            }
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::Utf8(s) => f.write_str(s),
        }
    }
}

/// Error returned when a [`Table`] would violate its shape invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' of type {data_type} holds a {found} value at row {row}")]
    TypeMismatch {
        column: String,
        data_type: DataType,
        found: DataType,
        row: usize,
    },
}

/// A named, homogeneous column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Type shared by every non-null value.
    pub data_type: DataType,
    /// True iff at least one value is null.
    pub nullable: bool,
    /// Values, one per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column, deriving `nullable` from the values.
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Self {
        let nullable = values.iter().any(Value::is_null);
        Self {
            name: name.into(),
            data_type,
            nullable,
            values,
        }
    }

    /// Number of values (rows) in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The [`Field`] describing this column.
    pub fn field(&self) -> Field {
        Field {
            name: self.name.clone(),
            data_type: self.data_type,
            nullable: self.nullable,
        }
    }

    fn check_homogeneous(&self) -> Result<(), TableError> {
        for (row, v) in self.values.iter().enumerate() {
            let found = v.data_type();
            if found != DataType::Null && found != self.data_type {
                return Err(TableError::TypeMismatch {
                    column: self.name.clone(),
                    data_type: self.data_type,
                    found,
                    row,
                });
            }
        }
        Ok(())
    }
}

/// In-memory columnar table.
///
/// All columns share the same row count and column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create a table, validating unique names, uniform length and homogeneous column types.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != row_count {
                return Err(TableError::LengthMismatch {
                    column: col.name.clone(),
                    expected: row_count,
                    found: col.len(),
                });
            }
            col.check_homogeneous()?;
        }
        Ok(Self { columns, row_count })
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns in the table.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns, in source order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// A column by name, if present.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The schema describing this table.
    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(Column::field).collect())
    }

    /// Values of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).map(move |idx| self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// A single cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.column(column)?.values.get(row)
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, DataType, Field, Schema, Table, TableError, Value};

    #[test]
    fn new_rejects_duplicate_names() {
        let err = Table::new(vec![
            Column::new("a", DataType::Int64, vec![Value::Int64(1)]),
            Column::new("a", DataType::Int64, vec![Value::Int64(2)]),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn new_rejects_ragged_columns() {
        let err = Table::new(vec![
            Column::new("a", DataType::Int64, vec![Value::Int64(1)]),
            Column::new("b", DataType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { found: 0, .. }));
    }

    #[test]
    fn new_rejects_mixed_types() {
        let err = Table::new(vec![Column::new(
            "a",
            DataType::Int64,
            vec![Value::Int64(1), Value::Utf8("x".to_string())],
        )])
        .unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { row: 1, .. }));
    }

    #[test]
    fn rows_follow_column_order() {
        let t = Table::new(vec![
            Column::new("name", DataType::Utf8, vec![Value::Utf8("Ada".into())]),
            Column::new("age", DataType::Int64, vec![Value::Null]),
        ])
        .unwrap();
        assert_eq!(t.row(0), Some(vec![&Value::Utf8("Ada".into()), &Value::Null]));
        assert!(t.column("age").unwrap().nullable);
        assert!(!t.column("name").unwrap().nullable);
        assert_eq!(t.row(1), None);
    }

    #[test]
    fn schema_describes_columns() {
        let t = Table::new(vec![
            Column::new("id", DataType::Int64, vec![Value::Int64(1), Value::Int64(2)]),
            Column::new("score", DataType::Float64, vec![Value::Null, Value::Float64(0.5)]),
        ])
        .unwrap();
        assert_eq!(
            t.schema(),
            Schema::new(vec![
                Field::required("id", DataType::Int64),
                Field::new("score", DataType::Float64),
            ])
        );
        assert_eq!(t.schema().field("score").map(|f| f.nullable), Some(true));
        assert_eq!(t.column("id").map(Column::len), Some(2));
        assert!(Column::new("e", DataType::Null, vec![]).is_empty());
        assert_eq!(t.value(1, "score").and_then(Value::as_f64), Some(0.5));
        assert_eq!(Value::Int64(3).as_f64(), Some(3.0));
    }

    #[test]
    fn float_display_keeps_fraction() {
        assert_eq!(Value::Float64(1.0).to_string(), "1.0");
        assert_eq!(Value::Float64(2.5).to_string(), "2.5");
        assert_eq!(Value::Float64(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Value::Null.to_string(), "");
    }
}
