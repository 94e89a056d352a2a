use tabular_ingest::ingestion::{convert, convert_str, ConvertOptions, Format};
use tabular_ingest::types::{DataType, Field, Schema, Value};
use tabular_ingest::ConvertError;

#[test]
fn convert_csv_from_path_happy_path() {
    let table = convert("tests/fixtures/people.csv", &ConvertOptions::default()).unwrap();

    assert_eq!(table.column_names(), vec!["id", "name", "score", "active"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.row(0).unwrap(),
        vec![
            &Value::Int64(1),
            &Value::Utf8("Ada".to_string()),
            &Value::Float64(98.5),
            &Value::Bool(true),
        ]
    );
    let types: Vec<DataType> = table.columns().iter().map(|c| c.data_type).collect();
    assert_eq!(
        types,
        vec![DataType::Int64, DataType::Utf8, DataType::Float64, DataType::Bool]
    );
}

#[test]
fn convert_tsv_matches_csv() {
    let csv = convert("tests/fixtures/people.csv", &ConvertOptions::default()).unwrap();
    let tsv = convert("tests/fixtures/people.tsv", &ConvertOptions::default()).unwrap();
    assert_eq!(csv, tsv);
}

#[test]
fn missing_age_is_null_in_an_integer_column() {
    let table = convert("tests/fixtures/name_age.csv", &ConvertOptions::default()).unwrap();

    assert_eq!(table.column_names(), vec!["name", "age"]);
    assert_eq!(
        table.row(0).unwrap(),
        vec![&Value::Utf8("Alice".to_string()), &Value::Int64(30)]
    );
    assert_eq!(
        table.row(1).unwrap(),
        vec![&Value::Utf8("Bob".to_string()), &Value::Null]
    );
    let age = table.column("age").unwrap();
    assert_eq!(age.data_type, DataType::Int64);
    assert!(age.nullable);
}

#[test]
fn header_only_file_has_columns_and_no_rows() {
    let table = convert("tests/fixtures/header_only.csv", &ConvertOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["name", "age"]);
    assert_eq!(table.row_count(), 0);
    assert_eq!(table.column("age").unwrap().data_type, DataType::Null);
}

#[test]
fn inconsistent_field_count_names_the_row() {
    let err = convert("tests/fixtures/ragged.csv", &ConvertOptions::default()).unwrap_err();
    match &err {
        ConvertError::ParseError { row, path, .. } => {
            assert_eq!(*row, Some(1));
            assert!(path.as_ref().unwrap().ends_with("ragged.csv"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(err.to_string().contains("expected 2 fields, found 3"));
}

#[test]
fn header_count_and_row_count_are_preserved() {
    let mut input = String::from("a,b,c\n");
    for i in 0..50 {
        input.push_str(&format!("{i},x{i},{}\n", i % 2 == 0));
    }
    let table = convert_str(&input, Format::CSV, &ConvertOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["a", "b", "c"]);
    assert_eq!(table.row_count(), 50);
    assert_eq!(table.value(49, "b"), Some(&Value::Utf8("x49".to_string())));
}

#[test]
fn declared_schema_validates_selected_columns() {
    let opts = ConvertOptions {
        schema: Some(Schema::new(vec![
            Field::required("id", DataType::Int64),
            Field::new("score", DataType::Utf8),
        ])),
        ..Default::default()
    };
    let table = convert("tests/fixtures/people.csv", &opts).unwrap();

    // Source order is kept; only declared columns are coerced.
    assert_eq!(table.column_names(), vec!["id", "name", "score", "active"]);
    assert_eq!(table.column("score").unwrap().data_type, DataType::Utf8);
    assert_eq!(table.value(1, "score"), Some(&Value::Utf8("87.25".to_string())));
    assert_eq!(table.column("active").unwrap().data_type, DataType::Bool);
}

#[test]
fn declared_schema_missing_column_is_a_parse_error() {
    let opts = ConvertOptions {
        schema: Some(Schema::new(vec![Field::new("email", DataType::Utf8)])),
        ..Default::default()
    };
    let err = convert("tests/fixtures/people.csv", &opts).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("parse error"));
    assert!(msg.contains("missing declared column 'email'"));
}
