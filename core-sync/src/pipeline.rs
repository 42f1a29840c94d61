//! # Media Pipeline
//!
//! Fetch-and-persist for a single capture.
//!
//! ## Workflow
//!
//! 1. Resolve the preferred asset from the envelope payload
//!    (photo: closeup, then thumbnail; video: download variant, then raw video)
//! 2. Reserve the deterministic filename in the album filename cache and stop
//!    if it is already present or claimed
//! 3. Download the asset bytes with its single-use access token
//! 4. Write the bytes into the target album
//!
//! Steps 3-4 run under the bounded retry policy. Asset tokens are spent by
//! the first download attempt, so every retry re-reads the capture for fresh
//! ones. A failed persist releases its reservation. Resolution failures are
//! reported as [`PipelineError::InvalidContent`] and never retried; neither
//! are downloads rejected as missing or unauthorized.
//!
//! Single-capture export ([`MediaPipeline::best_photo`],
//! [`MediaPipeline::video`]) always reads the capture fresh and returns the
//! bytes without touching the library.

use bridge_traits::content::{ContentService, FileAsset, MemoryContentEnvelope};
use bridge_traits::error::BridgeError;
use bridge_traits::http::RetryPolicy;
use bridge_traits::media::{MediaKind, MediaLibrary};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_library::{library_filename, CaptureId};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::album_cache::AlbumFilenameCache;
use crate::error::PipelineError;
use crate::retry::retry_pipeline;

/// Asset chosen for download, with the media kind it will be stored as.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAsset<'a> {
    pub kind: MediaKind,
    pub asset: &'a FileAsset,
}

/// Pick the asset to download for an envelope.
pub fn resolve_asset(envelope: &MemoryContentEnvelope) -> Result<ResolvedAsset<'_>, PipelineError> {
    let capture_id = CaptureId(envelope.id);
    let capture = envelope
        .capture()
        .ok_or(PipelineError::InvalidContent { capture_id })?;

    let kind = capture.media_kind();
    let asset = match kind {
        MediaKind::Photo => capture
            .closeup_asset
            .as_ref()
            .unwrap_or(&capture.thumbnail),
        MediaKind::Video => capture
            .download_video
            .as_ref()
            .or(capture.video.as_ref())
            .ok_or(PipelineError::InvalidContent { capture_id })?,
    };

    Ok(ResolvedAsset { kind, asset })
}

/// Result of a successful [`MediaPipeline::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Bytes were downloaded and written this call.
    Written,
    /// The album already held the file; nothing was downloaded or written.
    AlreadyPresent,
}

/// Media bytes exported for sharing.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedMedia {
    pub filename: String,
    pub kind: MediaKind,
    pub bytes: Bytes,
}

impl fmt::Debug for ExportedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedMedia")
            .field("filename", &self.filename)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub struct MediaPipeline {
    content: Arc<dyn ContentService>,
    library: Arc<dyn MediaLibrary>,
    album: Arc<AlbumFilenameCache>,
    retry_policy: RetryPolicy,
}

impl MediaPipeline {
    pub fn new(
        content: Arc<dyn ContentService>,
        library: Arc<dyn MediaLibrary>,
        album_name: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let album = Arc::new(AlbumFilenameCache::new(library.clone(), album_name));
        Self {
            content,
            library,
            album,
            retry_policy,
        }
    }

    pub fn album_cache(&self) -> &AlbumFilenameCache {
        &self.album
    }

    /// Make sure the capture's media is present in the target album.
    #[instrument(skip(self, envelope), fields(capture_id = %envelope.id))]
    pub async fn persist(
        &self,
        envelope: &MemoryContentEnvelope,
    ) -> Result<PersistOutcome, PipelineError> {
        let capture_id = CaptureId(envelope.id);
        let resolved = resolve_asset(envelope)?;
        let filename = library_filename(capture_id, resolved.kind);
        let name = filename.as_str();
        let created_at = envelope.user_created_at;

        let reserved = retry_pipeline(&self.retry_policy, "reserve", move || async move {
            self.album
                .reserve(name)
                .await
                .map_err(|e| save_failed(capture_id, e))
        })
        .await?;
        if !reserved {
            debug!(filename = name, "Already in album, skipping download");
            return Ok(PersistOutcome::AlreadyPresent);
        }

        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let result = retry_pipeline(&self.retry_policy, "persist", move || async move {
            // Asset tokens are single-use; only the first attempt may spend the
            // listed one.
            let bytes = if attempts.fetch_add(1, Ordering::Relaxed) == 0 {
                self.download(capture_id, resolved.asset).await?
            } else {
                self.download_fresh(capture_id, resolved.kind).await?
            };
            self.save(capture_id, bytes, name, resolved.kind, created_at)
                .await
        })
        .await;

        if result.is_err() {
            self.album.release(name).await;
        }
        result
    }

    async fn save(
        &self,
        capture_id: CaptureId,
        bytes: Bytes,
        filename: &str,
        kind: MediaKind,
        created_at: DateTime<Utc>,
    ) -> Result<PersistOutcome, PipelineError> {
        let album = self
            .album
            .album()
            .await
            .map_err(|e| save_failed(capture_id, e))?;

        self.library
            .write_asset(&album, bytes, filename, kind, created_at)
            .await
            .map_err(|e| save_failed(capture_id, e))?;

        info!(filename, kind = %kind, "Saved capture to album");
        Ok(PersistOutcome::Written)
    }

    async fn download(&self, capture_id: CaptureId, asset: &FileAsset) -> Result<Bytes, PipelineError> {
        self.content
            .download_asset(capture_id.as_uuid(), asset)
            .await
            .map_err(|e| PipelineError::download_failed(capture_id, &e))
    }

    /// Re-read the capture for a fresh asset token, then download it.
    async fn download_fresh(
        &self,
        capture_id: CaptureId,
        expected: MediaKind,
    ) -> Result<Bytes, PipelineError> {
        let envelope = self
            .content
            .fetch_item(capture_id.as_uuid())
            .await
            .map_err(|e| PipelineError::download_failed(capture_id, &e))?;

        let resolved = resolve_asset(&envelope)?;
        if resolved.kind != expected {
            return Err(PipelineError::InvalidContent { capture_id });
        }
        debug!(capture_id = %capture_id, "Downloading with refreshed asset token");
        self.download(capture_id, resolved.asset).await
    }

    // =========================================================================
    // Single-capture export
    // =========================================================================

    /// Highest quality still for a photo capture.
    #[instrument(skip(self))]
    pub async fn best_photo(&self, capture_id: CaptureId) -> Result<ExportedMedia, PipelineError> {
        self.export(capture_id, MediaKind::Photo).await
    }

    /// Video file for a video capture.
    #[instrument(skip(self))]
    pub async fn video(&self, capture_id: CaptureId) -> Result<ExportedMedia, PipelineError> {
        self.export(capture_id, MediaKind::Video).await
    }

    async fn export(
        &self,
        capture_id: CaptureId,
        expected: MediaKind,
    ) -> Result<ExportedMedia, PipelineError> {
        let bytes = retry_pipeline(&self.retry_policy, "export", move || {
            self.download_fresh(capture_id, expected)
        })
        .await?;

        Ok(ExportedMedia {
            filename: library_filename(capture_id, expected),
            kind: expected,
            bytes,
        })
    }
}

fn save_failed(capture_id: CaptureId, error: BridgeError) -> PipelineError {
    PipelineError::SaveFailed {
        capture_id,
        message: error.to_string(),
    }
}
