//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// The global subscriber can only be installed once per process, so every
// assertion about the installed stack lives in this single test.
#[test]
fn test_init_logging_mirrors_events_to_host_sink() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::info!(
        target: "core_sync::reconciler",
        total = 45u64,
        access_token = "leaked",
        "Phase 1: probing remote total"
    );
    tracing::trace!(target: "core_sync::reconciler", "filtered out below debug");
    tracing::info!(target: "sqlx::query", "dependency noise below warn");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Phase 1: probing remote total");
        assert_eq!(entries[0].fields.get("total"), Some(&"45".to_string()));
        assert_eq!(
            entries[0].fields.get("access_token"),
            Some(&"[REDACTED]".to_string())
        );
    }

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err(), "second initialization must fail");
}

#[test]
fn test_pii_redaction() {
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("bearer", "abc"), "[REDACTED]");

    let redacted = redact_if_sensitive("account", "pin-owner@example.com");
    assert!(redacted.starts_with('p'));
    assert!(!redacted.contains("example.com"));

    assert_eq!(redact_if_sensitive("album", "Ai Pin"), "Ai Pin");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/ana/Pictures/Ai Pin/1.mp4"), "1.mp4");
    assert_eq!(strip_path("D:\\Pictures\\Ai Pin\\2.jpg"), "2.jpg");
    assert_eq!(strip_path(""), "");
}
