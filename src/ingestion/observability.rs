//! Conversion outcome reporting.
//!
//! [`super::convert`] reports every call to the [`ConvertObserver`] set in
//! [`super::ConvertOptions::observer`]. Failures whose [`ConvertSeverity`] reaches
//! `alert_at_or_above` are additionally raised through [`ConvertObserver::on_alert`].

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConvertError;

use super::format::Format;

/// How serious a failed conversion is. Ordered, so it can be compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConvertSeverity {
    /// The input was reachable but could not be converted.
    Error,
    /// The input could not be read at all.
    Critical,
}

impl ConvertSeverity {
    /// Severity of a conversion failure.
    pub fn of(error: &ConvertError) -> Self {
        match error {
            ConvertError::NotFound { .. } | ConvertError::IoFailure { .. } => Self::Critical,
            ConvertError::UnsupportedFormat { .. }
            | ConvertError::ParseError { .. }
            | ConvertError::ExportFailure { .. } => Self::Error,
        }
    }
}

/// What is known about a conversion when it is reported.
#[derive(Debug, Clone)]
pub struct ConvertContext {
    pub path: PathBuf,
    /// `None` when the call failed before a format was resolved.
    pub format: Option<Format>,
}

/// Shape of a successfully converted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertStats {
    pub rows: usize,
    pub columns: usize,
}

/// Receives conversion outcomes.
pub trait ConvertObserver: Send + Sync {
    fn on_success(&self, _ctx: &ConvertContext, _stats: ConvertStats) {}

    fn on_failure(&self, _ctx: &ConvertContext, _severity: ConvertSeverity, _error: &ConvertError) {}

    /// Called after `on_failure` when the severity meets the alert threshold.
    ///
    /// Defaults to a second `on_failure` call.
    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every callback to each inner observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ConvertObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ConvertObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ConvertObserver for CompositeObserver {
    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.observers
            .iter()
            .for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.observers
            .iter()
            .for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// One reported outcome, rendered as a single `key=value` log line.
enum Event<'a> {
    Ok(ConvertStats),
    Fail(ConvertSeverity, &'a ConvertError),
    Alert(ConvertSeverity, &'a ConvertError),
}

struct Line<'a> {
    ctx: &'a ConvertContext,
    event: Event<'a>,
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tag, severity) = match &self.event {
            Event::Ok(_) => ("ok", None),
            Event::Fail(s, _) => ("fail", Some(s)),
            Event::Alert(s, _) => ("ALERT", Some(s)),
        };
        f.write_str(tag)?;
        if let Some(s) = severity {
            write!(f, " severity={s:?}")?;
        }
        match self.ctx.format {
            Some(format) => write!(f, " format={format}")?,
            None => f.write_str(" format=unknown")?,
        }
        write!(f, " path={}", self.ctx.path.display())?;
        match &self.event {
            Event::Ok(stats) => write!(f, " rows={} columns={}", stats.rows, stats.columns),
            Event::Fail(_, e) | Event::Alert(_, e) => write!(f, " err={e}"),
        }
    }
}

/// Prints one line per outcome to stderr, prefixed with `[convert]`.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl StdErrObserver {
    fn emit(&self, line: Line<'_>) {
        eprintln!("[convert] {line}");
    }
}

impl ConvertObserver for StdErrObserver {
    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        self.emit(Line {
            ctx,
            event: Event::Ok(stats),
        });
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.emit(Line {
            ctx,
            event: Event::Fail(severity, error),
        });
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.emit(Line {
            ctx,
            event: Event::Alert(severity, error),
        });
    }
}

/// Forwards outcomes to `tracing`: successes at `info`, failures at `warn`, alerts at `error`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ConvertObserver for TracingObserver {
    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        tracing::info!(
            path = %ctx.path.display(),
            format = ?ctx.format,
            rows = stats.rows,
            columns = stats.columns,
            "conversion succeeded"
        );
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        tracing::warn!(
            path = %ctx.path.display(),
            format = ?ctx.format,
            ?severity,
            error = %error,
            "conversion failed"
        );
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        tracing::error!(
            path = %ctx.path.display(),
            format = ?ctx.format,
            ?severity,
            error = %error,
            "conversion alert"
        );
    }
}

/// Appends one line per outcome to a log file, prefixed with the unix time in seconds.
///
/// The log is best-effort: open and write errors are dropped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn emit(&self, line: Line<'_>) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", unix_ts());
        }
    }
}

impl ConvertObserver for FileObserver {
    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        self.emit(Line {
            ctx,
            event: Event::Ok(stats),
        });
    }

    fn on_failure(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.emit(Line {
            ctx,
            event: Event::Fail(severity, error),
        });
    }

    fn on_alert(&self, ctx: &ConvertContext, severity: ConvertSeverity, error: &ConvertError) {
        self.emit(Line {
            ctx,
            event: Event::Alert(severity, error),
        });
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ConvertContext, ConvertSeverity, ConvertStats, Event, Line};
    use crate::error::ConvertError;
    use crate::ingestion::Format;

    #[test]
    fn severity_orders_critical_above_error() {
        assert!(ConvertSeverity::Critical > ConvertSeverity::Error);
        let missing = ConvertError::NotFound {
            path: PathBuf::from("x.csv"),
        };
        assert_eq!(ConvertSeverity::of(&missing), ConvertSeverity::Critical);
    }

    #[test]
    fn lines_render_outcome_fields() {
        let ctx = ConvertContext {
            path: PathBuf::from("people.csv"),
            format: Some(Format::CSV),
        };
        let ok = Line {
            ctx: &ctx,
            event: Event::Ok(ConvertStats {
                rows: 2,
                columns: 4,
            }),
        };
        assert_eq!(
            ok.to_string(),
            "ok format=delimited(',') path=people.csv rows=2 columns=4"
        );

        let ctx = ConvertContext {
            format: None,
            ..ctx
        };
        let err = ConvertError::NotFound {
            path: PathBuf::from("people.csv"),
        };
        let alert = Line {
            ctx: &ctx,
            event: Event::Alert(ConvertSeverity::Critical, &err),
        };
        assert_eq!(
            alert.to_string(),
            "ALERT severity=Critical format=unknown path=people.csv err=not found: people.csv"
        );
    }
}
