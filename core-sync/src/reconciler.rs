//! # Capture Reconciler
//!
//! Mirrors the remote capture collection into the local store and the target
//! media album.
//!
//! ## Workflow
//!
//! 1. Probe the remote total with a single-item page
//! 2. Gate on media library permission when there is anything to sync;
//!    otherwise just refresh the cached status
//! 3. Reset progress to `{synced: 0, total}` and invalidate the album cache
//! 4. Fetch every page concurrently; within a page, reconcile items
//!    concurrently (bounded by `max_concurrent_items`)
//! 5. Delete every local record whose identifier was not seen this pass, then
//!    flush the store
//!
//! Items already marked downloaded are never fetched again, and an identifier
//! listed more than once is reconciled only the first time. Per-item failures
//! are logged and leave the record's `locally_downloaded` flag false so the
//! next pass retries them; they never abort the pass. Progress counts attempted
//! items, not successful ones.
//!
//! Only one pass runs at a time. Cancellation is observed at page and item
//! boundaries and skips the cleanup phase, since the seen-identifier set would
//! be incomplete.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let reconciler = CaptureReconciler::new(
//!     content, repository, media_library, permission_gate, clock, event_bus,
//!     SyncConfig::default(),
//! );
//! let report = reconciler.synchronize().await?;
//! println!("{} downloaded, {} removed", report.downloaded, report.deleted);
//! ```

use bridge_traits::content::{ContentService, MemoryContentEnvelope};
use bridge_traits::http::RetryPolicy;
use bridge_traits::media::MediaLibrary;
use bridge_traits::permission::PermissionGate;
use bridge_traits::time::Clock;
use core_library::{
    CaptureId, CapturePredicate, CaptureRecord, CaptureRepository, ProcessingStatus,
};
use core_runtime::config::{
    CoreConfig, DEFAULT_ALBUM_NAME, DEFAULT_MAX_CONCURRENT_ITEMS, DEFAULT_PAGE_SIZE,
    DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY,
};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, SyncEvent};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::permission::PermissionCoordinator;
use crate::pipeline::{MediaPipeline, PersistOutcome};
use crate::progress::ProgressTracker;

/// Engine knobs for a reconciliation pass
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Items requested per page
    pub page_size: u32,

    /// Upper bound on items being reconciled at once across all pages
    pub max_concurrent_items: usize,

    /// Target album in the media library
    pub album_name: String,

    /// Retry budget for download and save steps
    pub retry_policy: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_items: DEFAULT_MAX_CONCURRENT_ITEMS,
            album_name: DEFAULT_ALBUM_NAME.to_string(),
            retry_policy: RetryPolicy {
                max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
                base_delay: DEFAULT_RETRY_BASE_DELAY,
                max_delay: DEFAULT_RETRY_MAX_DELAY,
                use_exponential_backoff: true,
            },
        }
    }
}

impl From<&CoreConfig> for SyncConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_concurrent_items: config.max_concurrent_items,
            album_name: config.album_name.clone(),
            retry_policy: config.retry_policy.clone(),
        }
    }
}

/// Summary of a completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote total reported by the probe
    pub total: u64,
    /// Items attempted, including unrecognized envelopes
    pub processed: u64,
    pub downloaded: u64,
    /// Items already downloaded or already present in the album
    pub skipped: u64,
    pub failed: u64,
    /// Stale records removed by cleanup
    pub deleted: u64,
    pub duration_ms: u64,
}

/// Number of pages needed to cover `total` items.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Downloaded,
    Skipped,
    Failed,
    Unrecognized,
    /// The identifier was already claimed by another item this pass.
    Duplicate,
    Cancelled,
}

/// Shared state for every item of one pass.
#[derive(Clone, Copy)]
struct PassContext<'a> {
    total: u64,
    semaphore: &'a Semaphore,
    /// Identifiers already taken up this pass; remote listings can repeat an
    /// item across pages.
    claimed: &'a Mutex<HashSet<CaptureId>>,
    cancellation_token: &'a CancellationToken,
}

#[derive(Debug)]
struct ItemResult {
    id: Option<CaptureId>,
    outcome: ItemOutcome,
}

impl ItemResult {
    fn cancelled() -> Self {
        Self {
            id: None,
            outcome: ItemOutcome::Cancelled,
        }
    }
}

pub struct CaptureReconciler {
    content: Arc<dyn ContentService>,
    repository: Arc<dyn CaptureRepository>,
    pipeline: Arc<MediaPipeline>,
    permissions: PermissionCoordinator,
    progress: Arc<ProgressTracker>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    config: SyncConfig,
    pass_lock: Mutex<()>,
}

impl CaptureReconciler {
    pub fn new(
        content: Arc<dyn ContentService>,
        repository: Arc<dyn CaptureRepository>,
        media_library: Arc<dyn MediaLibrary>,
        permission_gate: Arc<dyn PermissionGate>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        config: SyncConfig,
    ) -> Self {
        let progress = Arc::new(ProgressTracker::new());
        let pipeline = Arc::new(MediaPipeline::new(
            content.clone(),
            media_library,
            config.album_name.clone(),
            config.retry_policy.clone(),
        ));

        Self {
            content,
            repository,
            pipeline,
            permissions: PermissionCoordinator::new(permission_gate, progress.clone()),
            progress,
            clock,
            event_bus,
            config,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn progress(&self) -> Arc<ProgressTracker> {
        self.progress.clone()
    }

    pub fn permissions(&self) -> &PermissionCoordinator {
        &self.permissions
    }

    pub fn pipeline(&self) -> Arc<MediaPipeline> {
        self.pipeline.clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.progress.snapshot().is_syncing
    }

    /// Hold the pass lock so no pass can start until the guard is dropped.
    ///
    /// Fails with [`SyncError::SyncInProgress`] while a pass is running.
    pub fn try_exclusive(&self) -> Result<MutexGuard<'_, ()>> {
        self.pass_lock
            .try_lock()
            .map_err(|_| SyncError::SyncInProgress)
    }

    /// Run one full reconciliation pass.
    pub async fn synchronize(&self) -> Result<SyncReport> {
        self.synchronize_with_cancellation(CancellationToken::new())
            .await
    }

    /// Run one full reconciliation pass, stopping early once `cancellation_token`
    /// fires.
    #[instrument(skip(self, cancellation_token))]
    pub async fn synchronize_with_cancellation(
        &self,
        cancellation_token: CancellationToken,
    ) -> Result<SyncReport> {
        let _pass = self.try_exclusive().inspect_err(|_| {
            warn!("Sync requested while another pass is running");
        })?;

        let started = Instant::now();
        self.progress.begin();

        let result = self.run_pass(&cancellation_token, started).await;

        let synced = self.progress.snapshot().synced_count;
        self.progress.finish();

        match &result {
            Ok(report) => {
                info!(
                    processed = report.processed,
                    downloaded = report.downloaded,
                    skipped = report.skipped,
                    failed = report.failed,
                    deleted = report.deleted,
                    duration_ms = report.duration_ms,
                    "Sync completed"
                );
                self.emit(SyncEvent::Completed {
                    processed: report.processed,
                    downloaded: report.downloaded,
                    skipped: report.skipped,
                    failed: report.failed,
                    deleted: report.deleted,
                    duration_ms: report.duration_ms,
                });
            }
            Err(SyncError::Cancelled) => {
                info!(synced, "Sync cancelled");
                self.emit(SyncEvent::Cancelled { synced });
            }
            Err(e) => {
                error!(error = %e, "Sync failed");
                self.emit(SyncEvent::Failed {
                    message: e.user_message().to_string(),
                });
            }
        }

        result
    }

    async fn run_pass(
        &self,
        cancellation_token: &CancellationToken,
        started: Instant,
    ) -> Result<SyncReport> {
        // Phase 1: Probe remote total
        info!("Phase 1: Probing remote capture count");
        let total = self
            .probe_total()
            .await
            .map_err(|e| SyncError::SyncFailed(e.to_string()))?;
        let page_size = self.config.page_size.max(1);
        let pages = page_count(total, page_size);
        debug!(total, pages, page_size, "Probed remote total");

        // Phase 2: Permission gate
        if total > 0 {
            info!("Phase 2: Checking media library permission");
            let status = self
                .permissions
                .ensure_authorized()
                .await
                .map_err(|e| SyncError::SyncFailed(e.to_string()))?;
            if !status.is_authorized() {
                return Err(SyncError::PermissionDenied);
            }
        } else if let Err(e) = self.permissions.refresh().await {
            warn!(error = %e, "Failed to refresh media library permission");
        }

        if cancellation_token.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        self.progress.reset(total);
        self.pipeline.album_cache().invalidate().await;
        self.emit(SyncEvent::Started { total });

        // Phase 3: Reconcile pages
        info!("Phase 3: Reconciling {} pages", pages);
        let semaphore = Semaphore::new(self.config.max_concurrent_items.max(1));
        let claimed = Mutex::new(HashSet::new());
        let page_results = try_join_all((0..pages).map(|index| {
            let ctx = PassContext {
                total,
                semaphore: &semaphore,
                claimed: &claimed,
                cancellation_token,
            };
            self.sync_page(index as u32, page_size, ctx)
        }))
        .await?;

        if cancellation_token.is_cancelled() {
            info!("Cancellation observed, skipping cleanup");
            return Err(SyncError::Cancelled);
        }

        let mut report = SyncReport {
            total,
            ..SyncReport::default()
        };
        let mut seen = Vec::new();
        for item in page_results.into_iter().flatten() {
            match item.outcome {
                ItemOutcome::Downloaded => report.downloaded += 1,
                ItemOutcome::Skipped | ItemOutcome::Duplicate => report.skipped += 1,
                ItemOutcome::Failed => report.failed += 1,
                ItemOutcome::Unrecognized => {}
                ItemOutcome::Cancelled => continue,
            }
            report.processed += 1;
            if let Some(id) = item.id {
                seen.push(id);
            }
        }

        // Phase 4: Cleanup
        info!("Phase 4: Removing captures absent from remote");
        let deleted = self
            .repository
            .delete(&CapturePredicate::IdNotIn(seen))
            .await?;
        self.repository.save().await?;

        if deleted > 0 {
            info!(deleted, "Removed stale captures");
            self.event_bus
                .emit(CoreEvent::Library(LibraryEvent::CapturesRemoved {
                    count: deleted,
                }))
                .ok();
        }

        report.deleted = deleted;
        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn probe_total(&self) -> Result<u64> {
        let probe = self
            .content
            .fetch_page(0, 1)
            .await
            .map_err(|e| SyncError::ProbeFailed(e.to_string()))?;
        Ok(probe.total_elements)
    }

    #[instrument(skip(self, ctx))]
    async fn sync_page(
        &self,
        index: u32,
        page_size: u32,
        ctx: PassContext<'_>,
    ) -> Result<Vec<ItemResult>> {
        if ctx.cancellation_token.is_cancelled() {
            return Ok(Vec::new());
        }

        let page = self
            .content
            .fetch_page(index, page_size)
            .await
            .map_err(|e| SyncError::SyncFailed(format!("page {}: {}", index, e)))?;
        debug!(items = page.items.len(), "Fetched page");

        let capture_ids: Vec<CaptureId> = page
            .items
            .iter()
            .filter(|envelope| envelope.capture().is_some())
            .map(|envelope| CaptureId(envelope.id))
            .collect();

        let downloaded: HashSet<CaptureId> = if capture_ids.is_empty() {
            HashSet::new()
        } else {
            self.repository
                .fetch(
                    &CapturePredicate::IdIn(capture_ids)
                        .and(CapturePredicate::LocallyDownloaded(true)),
                )
                .await?
                .into_iter()
                .map(|record| record.id)
                .collect()
        };

        let items = page
            .items
            .iter()
            .map(|envelope| self.sync_item(envelope, &downloaded, ctx));
        Ok(join_all(items).await)
    }

    async fn sync_item(
        &self,
        envelope: &MemoryContentEnvelope,
        downloaded: &HashSet<CaptureId>,
        ctx: PassContext<'_>,
    ) -> ItemResult {
        let Ok(_permit) = ctx.semaphore.acquire().await else {
            return ItemResult::cancelled();
        };
        if ctx.cancellation_token.is_cancelled() {
            return ItemResult::cancelled();
        }

        let result = match CaptureRecord::from_envelope(envelope) {
            Some(record) => {
                let id = record.id;
                let outcome = if ctx.claimed.lock().await.insert(id) {
                    let already_downloaded = downloaded.contains(&id);
                    self.reconcile_capture(record, envelope, already_downloaded)
                        .await
                } else {
                    debug!(capture_id = %id, "Capture listed twice, skipping repeat");
                    ItemOutcome::Duplicate
                };
                ItemResult {
                    id: Some(id),
                    outcome,
                }
            }
            None => {
                debug!(id = %envelope.id, "Skipping unrecognized content");
                ItemResult {
                    id: None,
                    outcome: ItemOutcome::Unrecognized,
                }
            }
        };

        let synced = self.progress.increment();
        self.emit(SyncEvent::Progress {
            synced,
            total: ctx.total,
        });
        result
    }

    async fn reconcile_capture(
        &self,
        mut record: CaptureRecord,
        envelope: &MemoryContentEnvelope,
        already_downloaded: bool,
    ) -> ItemOutcome {
        let outcome = if already_downloaded {
            ItemOutcome::Skipped
        } else {
            match self.pipeline.persist(envelope).await {
                Ok(PersistOutcome::Written) => ItemOutcome::Downloaded,
                Ok(PersistOutcome::AlreadyPresent) => ItemOutcome::Skipped,
                Err(e) => {
                    error!(capture_id = %record.id, error = %e, "Failed to process capture");
                    ItemOutcome::Failed
                }
            }
        };

        let confirmed = outcome != ItemOutcome::Failed;
        record.locally_downloaded = confirmed;
        record.processing_status = if confirmed {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::Failed
        };
        record.last_sync_date = Some(self.clock.now());

        if let Err(e) = self.repository.upsert(&record).await {
            error!(capture_id = %record.id, error = %e, "Failed to store capture");
            return ItemOutcome::Failed;
        }
        outcome
    }

    fn emit(&self, event: SyncEvent) {
        self.event_bus.emit(CoreEvent::Sync(event)).ok();
    }
}
