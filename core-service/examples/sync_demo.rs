//! Capture sync demonstration
//!
//! Runs one reconciliation pass against the live capture service using the
//! desktop bridges: media lands in `~/Pictures/<album>` and the capture store
//! is created next to the working directory.
//!
//! Run with:
//! ```bash
//! HUMANE_ACCESS_TOKEN=... cargo run -p core-service --example sync_demo
//!
//! # JSON logs and a custom store location
//! HUMANE_ACCESS_TOKEN=... cargo run -p core-service --example sync_demo -- json /tmp/captures.db
//! ```

use bridge_traits::time::LogLevel;
use core_library::CaptureQuery;
use core_runtime::config::CoreConfig;
use core_runtime::events::CoreEvent;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::CaptureSyncService;
use std::env;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    let database_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "captures.db".to_string());

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug)
            .with_pii_redaction(true),
    )?;

    let token = env::var("HUMANE_ACCESS_TOKEN")?;
    let config = CoreConfig::builder()
        .database_path(database_path)
        .access_token(token)
        .build()?;

    let service = CaptureSyncService::bootstrap(config).await?;

    let mut events = service.events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let terminal = matches!(&event, CoreEvent::Sync(e) if e.is_terminal());
            info!(severity = ?event.severity(), "{}", event.description());
            if terminal {
                break;
            }
        }
    });

    match service.sync_captures().await {
        Ok(report) => info!(
            total = report.total,
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            deleted = report.deleted,
            "Pass finished"
        ),
        Err(e) => warn!(error = %e, "{}", e.user_message()),
    }
    printer.await?;

    for record in service.captures(&CaptureQuery::recent(5)).await? {
        info!(
            id = %record.id,
            kind = ?record.kind,
            downloaded = record.locally_downloaded,
            "Recent capture"
        );
    }

    Ok(())
}
