use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Error type returned by conversion and export functions.
///
/// Every variant carries the source path when one is known. In-memory entry points
/// (e.g. [`crate::ingestion::convert_str`]) produce errors without a path; the path-based
/// entry points attach it via [`ConvertError::with_path`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The path does not resolve to a readable regular file.
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Neither the format hint nor detection produced a recognized format.
    #[error("unsupported format{}: {message}", at_path(.path))]
    UnsupportedFormat {
        path: Option<PathBuf>,
        message: String,
    },

    /// Content violates the structural grammar of the format, or a declared schema.
    ///
    /// `row` is the 0-based data row index (the header is not counted).
    #[error("parse error{}{}: {message}", at_path(.path), at_position(.row, .column))]
    ParseError {
        path: Option<PathBuf>,
        row: Option<usize>,
        column: Option<String>,
        message: String,
    },

    /// Underlying read or write error (permission, truncation, device error).
    #[error("io failure{}: {source}", at_path(.path))]
    IoFailure {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// An encoder rejected the table during export.
    #[error("export failed{}: {message}", at_path(.path))]
    ExportFailure {
        path: Option<PathBuf>,
        message: String,
    },
}

impl ConvertError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            path: None,
            row: None,
            column: None,
            message: message.into(),
        }
    }

    pub(crate) fn parse_at(row: usize, column: Option<&str>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: None,
            row: Some(row),
            column: column.map(str::to_owned),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: None,
            message: message.into(),
        }
    }

    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::IoFailure { path: None, source }
    }

    pub(crate) fn export(message: impl Into<String>) -> Self {
        Self::ExportFailure {
            path: None,
            message: message.into(),
        }
    }

    /// Attach `path` to this error if it does not already carry one.
    pub fn with_path(mut self, p: &Path) -> Self {
        match &mut self {
            Self::NotFound { .. } => {}
            Self::UnsupportedFormat { path, .. }
            | Self::ParseError { path, .. }
            | Self::IoFailure { path, .. }
            | Self::ExportFailure { path, .. } => {
                if path.is_none() {
                    *path = Some(p.to_path_buf());
                }
            }
        }
        self
    }

    /// The path this error refers to, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } => Some(path.as_path()),
            Self::UnsupportedFormat { path, .. }
            | Self::ParseError { path, .. }
            | Self::IoFailure { path, .. }
            | Self::ExportFailure { path, .. } => path.as_deref(),
        }
    }

    /// The 0-based data row index for parse errors that point at a row.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::ParseError { row, .. } => *row,
            _ => None,
        }
    }
}

impl From<csv::Error> for ConvertError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::parse(err.to_string());
        }
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::io(e),
            other => Self::parse(format!("{other:?}")),
        }
    }
}

impl From<parquet::errors::ParquetError> for ConvertError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Self::parse(format!("parquet: {err}"))
    }
}

fn at_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" in {}", p.display()),
        None => String::new(),
    }
}

fn at_position(row: &Option<usize>, column: &Option<String>) -> String {
    match (row, column) {
        (Some(r), Some(c)) => format!(" at row {r} column '{c}'"),
        (Some(r), None) => format!(" at row {r}"),
        (None, Some(c)) => format!(" at column '{c}'"),
        (None, None) => String::new(),
    }
}
