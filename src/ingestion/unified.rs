//! Unified conversion entrypoint.
//!
//! Most callers should use [`convert`], which reads a file into an in-memory
//! [`crate::types::Table`].
//!
//! - If [`ConvertOptions::format`] is [`FormatHint::Auto`], the format is detected from the file
//!   extension and, failing that, from the leading bytes.
//! - If a [`crate::types::Schema`] is set, the named columns are validated and coerced instead of
//!   inferred.
//! - If a [`ConvertObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::types::{Schema, Table};

use super::format::{detect_format, path_extension, sniff_window, Format, FormatHint};
use super::infer::{build_table, RawTable};
use super::observability::{ConvertContext, ConvertObserver, ConvertSeverity, ConvertStats};
use super::{delimited, json, parquet};

/// Options controlling conversion.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Format selection; [`FormatHint::Auto`] detects it.
    pub format: FormatHint,
    /// Declared columns to validate instead of infer.
    pub schema: Option<Schema>,
    /// Parsing and inference settings.
    pub config: ConvertConfig,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ConvertObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ConvertSeverity,
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("format", &self.format)
            .field("schema", &self.schema)
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: FormatHint::Auto,
            schema: None,
            config: ConvertConfig::default(),
            observer: None,
            alert_at_or_above: ConvertSeverity::Critical,
        }
    }
}

/// Convert the file at `path` into a [`Table`].
///
/// The file is read in full under a scoped handle that is released before parsing starts, so
/// the handle is closed on every exit path. Either a complete table is returned or an error;
/// there are no partial results.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row and column counts
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ## Auto-detect
///
/// ```no_run
/// use tabular_ingest::ingestion::{convert, ConvertOptions};
///
/// # fn main() -> Result<(), tabular_ingest::ConvertError> {
/// let table = convert("people.csv", &ConvertOptions::default())?;
/// println!("rows={} columns={:?}", table.row_count(), table.column_names());
/// # Ok(())
/// # }
/// ```
///
/// ## Declare the format and validate a column
///
/// ```no_run
/// use tabular_ingest::ingestion::{convert, ConvertOptions, Format, FormatHint};
/// use tabular_ingest::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), tabular_ingest::ConvertError> {
/// let opts = ConvertOptions {
///     format: FormatHint::Declared(Format::TSV),
///     schema: Some(Schema::new(vec![Field::required("id", DataType::Int64)])),
///     ..Default::default()
/// };
/// let table = convert("export_without_extension", &opts)?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Observability
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabular_ingest::ingestion::{convert, ConvertOptions, ConvertSeverity, StdErrObserver};
///
/// let opts = ConvertOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     alert_at_or_above: ConvertSeverity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are Critical and trigger `on_alert` at this threshold.
/// let _err = convert("does_not_exist.csv", &opts).unwrap_err();
/// ```
pub fn convert(path: impl AsRef<Path>, options: &ConvertOptions) -> ConvertResult<Table> {
    let path = path.as_ref();
    let mut ctx = ConvertContext {
        path: path.to_path_buf(),
        format: None,
    };

    let result = convert_file(path, options, &mut ctx);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(table) => obs.on_success(
                &ctx,
                ConvertStats {
                    rows: table.row_count(),
                    columns: table.column_count(),
                },
            ),
            Err(e) => {
                let sev = ConvertSeverity::of(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// [`convert`] with default options.
pub fn convert_path(path: impl AsRef<Path>) -> ConvertResult<Table> {
    convert(path, &ConvertOptions::default())
}

fn convert_file(
    path: &Path,
    options: &ConvertOptions,
    ctx: &mut ConvertContext,
) -> ConvertResult<Table> {
    let data = read_source(path)?;

    let format = resolve_format(path, &data, options).map_err(|e| e.with_path(path))?;
    ctx.format = Some(format);
    tracing::debug!(path = %path.display(), %format, bytes = data.len(), "resolved format");

    let table = convert_bytes(data, format, options).map_err(|e| e.with_path(path))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "converted"
    );
    Ok(table)
}

/// Read the whole file. The handle lives only for the duration of this call.
fn read_source(path: &Path) -> ConvertResult<Vec<u8>> {
    let not_found = || ConvertError::NotFound {
        path: path.to_path_buf(),
    };

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(not_found());
        }
        Err(e) => return Err(ConvertError::io(e).with_path(path)),
    };

    let meta = file
        .metadata()
        .map_err(|e| ConvertError::io(e).with_path(path))?;
    if !meta.is_file() {
        return Err(not_found());
    }

    let mut buf = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
    file.read_to_end(&mut buf)
        .map_err(|e| ConvertError::io(e).with_path(path))?;
    Ok(buf)
}

fn resolve_format(path: &Path, data: &[u8], options: &ConvertOptions) -> ConvertResult<Format> {
    if let FormatHint::Declared(f) = options.format {
        return Ok(f);
    }

    let ext = path_extension(path);
    let leading = sniff_window(data, options.config.sniff_bytes);
    detect_format(ext, leading).ok_or_else(|| {
        ConvertError::unsupported(match ext {
            Some(ext) => format!("unrecognized extension '{ext}' and content is not sniffable"),
            None => "no extension and content is not sniffable".to_string(),
        })
    })
}

/// Convert in-memory content with an explicit format.
///
/// Uses `options.schema` and `options.config`; the format hint and observer are ignored.
pub fn convert_bytes(
    data: impl Into<Bytes>,
    format: Format,
    options: &ConvertOptions,
) -> ConvertResult<Table> {
    let raw = read_raw(data.into(), format, &options.config)?;
    build_table(raw, options.schema.as_ref(), &options.config)
}

/// Convert in-memory text with an explicit format.
///
/// ```rust
/// use tabular_ingest::ingestion::{convert_str, ConvertOptions, Format};
/// use tabular_ingest::types::{DataType, Value};
///
/// let table = convert_str("name,age\nAlice,30\nBob,\n", Format::CSV, &ConvertOptions::default())
///     .unwrap();
/// assert_eq!(table.column_names(), vec!["name", "age"]);
/// assert_eq!(table.column("age").unwrap().data_type, DataType::Int64);
/// assert_eq!(table.value(1, "age"), Some(&Value::Null));
/// ```
pub fn convert_str(input: &str, format: Format, options: &ConvertOptions) -> ConvertResult<Table> {
    convert_bytes(Bytes::copy_from_slice(input.as_bytes()), format, options)
}

fn read_raw(data: Bytes, format: Format, config: &ConvertConfig) -> ConvertResult<RawTable> {
    match format {
        Format::Delimited { delimiter } => delimited::read_delimited(&data[..], delimiter, config),
        Format::JsonLines => json::read_json_lines(utf8(&data)?, config),
        Format::Json => json::read_json(utf8(&data)?, config),
        Format::Parquet => parquet::read_parquet(data),
    }
}

fn utf8(data: &[u8]) -> ConvertResult<&str> {
    std::str::from_utf8(data).map_err(|e| {
        ConvertError::parse(format!(
            "input is not valid UTF-8 (byte offset {})",
            e.valid_up_to()
        ))
    })
}

/// Owned conversion request.
///
/// This can be useful if you want to enqueue conversions in a job system.
#[derive(Clone)]
pub struct ConvertRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling conversion.
    pub options: ConvertOptions,
}

impl fmt::Debug for ConvertRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertRequest")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

impl ConvertRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: ConvertOptions::default(),
        }
    }

    /// Execute the request by calling [`convert`].
    pub fn run(&self) -> ConvertResult<Table> {
        convert(&self.path, &self.options)
    }
}
