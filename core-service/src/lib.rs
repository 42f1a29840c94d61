//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] into the capture store, the
//! content connector and the sync engine, and exposes the operations host
//! applications call. Desktop apps typically enable the `desktop-shims`
//! feature so missing bridges fall back to the adapters in `bridge-desktop`.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .database_path(data_dir.join("captures.db"))
//!     .access_token(token)
//!     .build()?;
//! let service = CaptureSyncService::bootstrap(config).await?;
//!
//! let report = service.sync_captures().await?;
//! let recent = service.captures(&CaptureQuery::recent(30)).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::content::ContentService;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{
    CaptureId, CapturePredicate, CaptureQuery, CaptureRecord, CaptureRepository,
    SqliteCaptureRepository,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, LibraryEvent};
use core_sync::{
    CancellationToken, CaptureReconciler, ExportedMedia, SyncConfig, SyncError, SyncProgress,
    SyncReport,
};
use provider_humane::HumaneCenterConnector;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
///
/// Cloning is cheap and every clone drives the same engine.
#[derive(Clone)]
pub struct CaptureSyncService {
    repository: Arc<dyn CaptureRepository>,
    reconciler: Arc<CaptureReconciler>,
    event_bus: EventBus,
    /// Parent of every running pass's token; replaced on cancel.
    cancellation: Arc<Mutex<CancellationToken>>,
}

impl CaptureSyncService {
    /// Open the capture database, run migrations and assemble the engine.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        info!(album = %config.album_name, "Bootstrapping capture sync service");

        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let repository = Arc::new(SqliteCaptureRepository::new(pool));

        Self::with_repository(&config, repository)
    }

    /// Assemble the engine over an existing capture repository.
    pub fn with_repository(
        config: &CoreConfig,
        repository: Arc<dyn CaptureRepository>,
    ) -> Result<Self> {
        let content = content_service(config)?;
        let event_bus = EventBus::default();

        let reconciler = CaptureReconciler::new(
            content,
            repository.clone(),
            config.media_library.clone(),
            config.permission_gate.clone(),
            config.clock.clone(),
            event_bus.clone(),
            SyncConfig::from(config),
        );

        Ok(Self {
            repository,
            reconciler: Arc::new(reconciler),
            event_bus,
            cancellation: Arc::new(Mutex::new(CancellationToken::new())),
        })
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Run one reconciliation pass.
    ///
    /// Fails with `SyncInProgress` if another pass is already running.
    pub async fn sync_captures(&self) -> Result<SyncReport> {
        let token = self.cancellation.lock().await.child_token();
        Ok(self.reconciler.synchronize_with_cancellation(token).await?)
    }

    /// Ask the running pass, if any, to stop. Returns whether one was running.
    pub async fn cancel_sync(&self) -> bool {
        let mut parent = self.cancellation.lock().await;
        parent.cancel();
        *parent = CancellationToken::new();

        let running = self.reconciler.is_syncing();
        info!(running, "Sync cancellation requested");
        running
    }

    pub fn progress(&self) -> SyncProgress {
        self.reconciler.progress().snapshot()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<SyncProgress> {
        self.reconciler.progress().subscribe()
    }

    /// Re-query media library authorization without prompting.
    pub async fn has_media_permission(&self) -> Result<bool> {
        let status = self
            .reconciler
            .permissions()
            .refresh()
            .await
            .map_err(|e| CoreError::Sync(SyncError::SyncFailed(e.to_string())))?;
        Ok(status.is_authorized())
    }

    // =========================================================================
    // Browsing & export
    // =========================================================================

    pub async fn captures(&self, query: &CaptureQuery) -> Result<Vec<CaptureRecord>> {
        Ok(self.repository.query(query).await?)
    }

    pub async fn capture(&self, id: CaptureId) -> Result<CaptureRecord> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CoreError::Sync(SyncError::NotFound(id)))
    }

    pub async fn best_photo(&self, id: CaptureId) -> Result<ExportedMedia> {
        Ok(self.reconciler.pipeline().best_photo(id).await?)
    }

    pub async fn video(&self, id: CaptureId) -> Result<ExportedMedia> {
        Ok(self.reconciler.pipeline().video(id).await?)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Delete every local capture record. Media already written to the album
    /// is left in place.
    ///
    /// Refused with `SyncInProgress` while a pass is running.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<u64> {
        let _exclusive = self.reconciler.try_exclusive()?;

        let deleted = self.repository.delete(&CapturePredicate::All).await?;
        self.repository.save().await?;
        self.reconciler.pipeline().album_cache().invalidate().await;

        info!(deleted, "Capture store cleared");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::StoreCleared))
            .ok();
        Ok(deleted)
    }

    /// Subscribe to sync and library events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}

fn content_service(config: &CoreConfig) -> Result<Arc<dyn ContentService>> {
    if let Some(service) = &config.content_service {
        return Ok(service.clone());
    }

    let http_client = config.http_client.clone().ok_or_else(|| {
        CoreError::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "The capture connector needs an HTTP client. Inject one or a ContentService."
                .to_string(),
        }
    })?;
    let access_token = config.access_token.clone().ok_or_else(|| {
        CoreError::CapabilityMissing {
            capability: "AccessToken".to_string(),
            message: "The capture connector needs an access token.".to_string(),
        }
    })?;

    let connector = HumaneCenterConnector::new(http_client, &config.api_base_url, access_token)
        .with_retry_policy(config.retry_policy.clone());
    Ok(Arc::new(connector))
}
