//! Domain models for the local capture store
//!
//! A [`CaptureRecord`] is the durable, locally owned mirror of one remote
//! capture envelope. Records are created the first time an envelope is seen,
//! mutated in place on every subsequent pass and only deleted by reconciliation
//! cleanup or a full store reset.

use bridge_traits::content::MemoryContentEnvelope;
use bridge_traits::media::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Stable remote identifier of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CaptureId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Processing Status
// =============================================================================

/// Local processing state of a capture's media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ProcessingStatus::Pending),
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Capture Record
// =============================================================================

/// Deterministic media library filename for a capture.
///
/// `locally_downloaded == true` implies a file with this name exists in the
/// target album.
pub fn library_filename(id: CaptureId, kind: MediaKind) -> String {
    format!("{}.{}", id, kind.file_extension())
}

/// Locally persisted capture
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: CaptureId,
    /// Remote lifecycle state, stored as received
    pub state: String,
    pub kind: MediaKind,
    pub is_favorite: bool,
    /// Author-supplied creation time
    pub created_at: DateTime<Utc>,
    /// Author-supplied modification time
    pub modified_at: DateTime<Utc>,
    pub thumbnail_id: Uuid,
    pub thumbnail_access_token: String,
    pub locally_downloaded: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub processing_status: ProcessingStatus,
}

impl CaptureRecord {
    /// Translate a remote envelope into a fresh record.
    ///
    /// Returns `None` for payload kinds the client does not understand. The
    /// record starts out not downloaded and pending; the reconciler fills in
    /// the download state and sync timestamp.
    pub fn from_envelope(envelope: &MemoryContentEnvelope) -> Option<Self> {
        let capture = envelope.capture()?;

        Some(Self {
            id: CaptureId(envelope.id),
            state: capture.state.clone(),
            kind: capture.media_kind(),
            is_favorite: envelope.favorite,
            created_at: envelope.user_created_at,
            modified_at: envelope.user_last_modified,
            thumbnail_id: capture.thumbnail.file_id,
            thumbnail_access_token: capture.thumbnail.access_token.clone(),
            locally_downloaded: false,
            last_sync_date: None,
            processing_status: ProcessingStatus::Pending,
        })
    }

    pub fn is_photo(&self) -> bool {
        self.kind == MediaKind::Photo
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Filename this capture occupies in the media library.
    pub fn library_filename(&self) -> String {
        library_filename(self.id, self.kind)
    }

    /// Validate record data before persisting.
    pub fn validate(&self) -> Result<(), String> {
        if self.thumbnail_access_token.is_empty() {
            return Err("Thumbnail access token cannot be empty".to_string());
        }
        if self.locally_downloaded && self.processing_status != ProcessingStatus::Completed {
            return Err(format!(
                "Downloaded capture must be completed, got {}",
                self.processing_status
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for CaptureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRecord")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("is_favorite", &self.is_favorite)
            .field("created_at", &self.created_at)
            .field("modified_at", &self.modified_at)
            .field("thumbnail_id", &self.thumbnail_id)
            .field("thumbnail_access_token", &"[REDACTED]")
            .field("locally_downloaded", &self.locally_downloaded)
            .field("last_sync_date", &self.last_sync_date)
            .field("processing_status", &self.processing_status)
            .finish()
    }
}
