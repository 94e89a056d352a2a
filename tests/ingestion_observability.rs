use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_ingest::ingestion::{
    convert, CompositeObserver, ConvertContext, ConvertObserver, ConvertOptions, ConvertSeverity,
    ConvertStats, FileObserver, Format, TracingObserver,
};
use tabular_ingest::types::{DataType, Field, Schema};
use tabular_ingest::ConvertError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(Option<Format>, ConvertStats)>>,
    failures: Mutex<Vec<ConvertSeverity>>,
    alerts: Mutex<Vec<ConvertSeverity>>,
}

impl ConvertObserver for RecordingObserver {
    fn on_success(&self, ctx: &ConvertContext, stats: ConvertStats) {
        self.successes.lock().unwrap().push((ctx.format, stats));
    }

    fn on_failure(&self, _ctx: &ConvertContext, severity: ConvertSeverity, _error: &ConvertError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &ConvertContext, severity: ConvertSeverity, _error: &ConvertError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn observer_receives_success_with_stats_and_format() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ConvertOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    convert("tests/fixtures/people.csv", &opts).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![(Some(Format::CSV), ConvertStats { rows: 2, columns: 4 })]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_missing_file() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ConvertOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: ConvertSeverity::Critical,
        ..Default::default()
    };

    // Missing file -> NotFound -> Critical
    let _ = convert("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![ConvertSeverity::Critical]);
    assert_eq!(alerts, vec![ConvertSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ConvertOptions {
        schema: Some(Schema::new(vec![Field::new("definitely_missing", DataType::Utf8)])),
        observer: Some(obs.clone()),
        alert_at_or_above: ConvertSeverity::Critical,
        ..Default::default()
    };

    // Missing declared column -> ParseError -> Error severity -> no alert
    let _ = convert("tests/fixtures/people.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![ConvertSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn composite_fans_out_and_file_observer_appends() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let log_path = std::env::temp_dir().join(format!("tabular-ingest-observer-{nanos}.log"));

    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn ConvertObserver>> = vec![
        recording.clone(),
        Arc::new(FileObserver::new(&log_path)),
    ];
    let composite = CompositeObserver::new(observers);
    let opts = ConvertOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };

    convert("tests/fixtures/people.tsv", &opts).unwrap();
    let _ = convert("tests/fixtures/notes.unknown", &opts).unwrap_err();

    assert_eq!(recording.successes.lock().unwrap().len(), 1);
    assert_eq!(
        recording.failures.lock().unwrap().clone(),
        vec![ConvertSeverity::Error]
    );

    let log = fs::read_to_string(&log_path).unwrap();
    let _ = fs::remove_file(&log_path);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" ok format=delimited('\\t')"));
    assert!(lines[0].contains("rows=2 columns=4"));
    assert!(lines[1].contains(" fail severity=Error format=unknown"));
}

#[test]
fn tracing_observer_reports_without_a_subscriber() {
    let opts = ConvertOptions {
        observer: Some(Arc::new(TracingObserver)),
        alert_at_or_above: ConvertSeverity::Error,
        ..Default::default()
    };

    let table = convert("tests/fixtures/people.csv", &opts).unwrap();
    assert_eq!(table.row_count(), 2);

    let err = convert("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();
    assert!(matches!(err, ConvertError::NotFound { .. }));
    assert_eq!(ConvertSeverity::of(&err), ConvertSeverity::Critical);
}
