//! Delimited-text (CSV, TSV, ...) reader.

use std::io::Read;

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};

use super::infer::{RawCell, RawTable};

/// Read delimited text into a raw grid.
///
/// Rules:
///
/// - The first record is the header. An empty input yields a table with no columns.
/// - Every data record must have exactly as many fields as the header.
/// - Empty header names become `column_{index}`.
/// - A leading UTF-8 byte order mark is ignored.
pub fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    config: &ConvertConfig,
) -> ConvertResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(if config.trim_whitespace {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(reader);

    let mut records = rdr.records();
    let header = match records.next() {
        Some(rec) => rec?,
        None => return Ok(RawTable::default()),
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if idx == 0 {
                name.trim_start_matches('\u{feff}')
            } else {
                name
            };
            if name.trim().is_empty() {
                format!("column_{idx}")
            } else {
                name.to_owned()
            }
        })
        .collect();

    let mut raw = RawTable::new(names);
    let width = raw.names.len();
    for (row, result) in records.enumerate() {
        let record = result.map_err(|e| match ConvertError::from(e) {
            ConvertError::ParseError { message, .. } => ConvertError::parse_at(row, None, message),
            other => other,
        })?;

        if record.len() != width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(ConvertError::parse_at(
                row,
                None,
                format!(
                    "expected {width} fields, found {} (line {line})",
                    record.len()
                ),
            ));
        }

        raw.rows
            .push(record.iter().map(|s| RawCell::Text(s.to_owned())).collect());
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::read_delimited;
    use crate::config::ConvertConfig;
    use crate::error::ConvertError;
    use crate::ingestion::infer::RawCell;

    /// Yields `ok` once, then fails every read.
    struct FailingReader {
        ok: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ok.is_empty() {
                return Err(io::Error::other("device unplugged"));
            }
            let n = self.ok.len().min(buf.len());
            buf[..n].copy_from_slice(&self.ok[..n]);
            self.ok = &self.ok[n..];
            Ok(n)
        }
    }

    #[test]
    fn header_and_rows_are_split() {
        let raw = read_delimited("a,b\n1,2\n3,\n".as_bytes(), b',', &ConvertConfig::default())
            .unwrap();
        assert_eq!(raw.names, vec!["a", "b"]);
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[1][1], RawCell::Text(String::new()));
    }

    #[test]
    fn extra_field_reports_data_row_index() {
        let err = read_delimited(
            "a,b\n1,2\n3,4,5\n".as_bytes(),
            b',',
            &ConvertConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert!(err.to_string().contains("expected 2 fields, found 3"));
    }

    #[test]
    fn bom_and_blank_headers_are_normalized() {
        let raw = read_delimited(
            "\u{feff}id\t\n1\tx\n".as_bytes(),
            b'\t',
            &ConvertConfig::default(),
        )
        .unwrap();
        assert_eq!(raw.names, vec!["id", "column_1"]);
    }

    #[test]
    fn quoted_fields_may_contain_delimiters() {
        let raw = read_delimited(
            "name,note\nAda,\"a, b\"\n".as_bytes(),
            b',',
            &ConvertConfig::default(),
        )
        .unwrap();
        assert_eq!(raw.rows[0][1], RawCell::Text("a, b".to_string()));
    }

    #[test]
    fn empty_input_has_no_columns() {
        let raw = read_delimited("".as_bytes(), b',', &ConvertConfig::default()).unwrap();
        assert!(raw.names.is_empty());
        assert!(raw.rows.is_empty());
    }

    #[test]
    fn read_error_is_an_io_failure() {
        let err = read_delimited(
            FailingReader { ok: b"a,b\n1,2\n" },
            b',',
            &ConvertConfig::default(),
        )
        .unwrap_err();
        match err {
            ConvertError::IoFailure { path, source } => {
                assert!(path.is_none());
                assert_eq!(source.kind(), io::ErrorKind::Other);
                assert_eq!(source.to_string(), "device unplugged");
            }
            other => panic!("expected IoFailure, got {other:?}"),
        }
    }
}
