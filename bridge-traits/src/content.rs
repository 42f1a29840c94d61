//! Remote Content Contracts
//!
//! Wire types produced by the capture content service and the
//! [`ContentService`] trait the sync engine consumes.
//!
//! Envelopes are a read-only projection of server state. They are never
//! persisted verbatim; the sync engine translates capture envelopes into local
//! records and drops everything else.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;
use crate::media::MediaKind;

/// Downloadable binary resource.
///
/// The access token is short-lived and only valid for the download call that
/// consumes it, so it is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileAsset {
    #[serde(rename = "fileUUID")]
    pub file_id: Uuid,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl FileAsset {
    pub fn new(file_id: Uuid, access_token: impl Into<String>) -> Self {
        Self {
            file_id,
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for FileAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAsset")
            .field("file_id", &self.file_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Capture type as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteCaptureType {
    Photo,
    Video,
    #[serde(other)]
    Other,
}

/// Payload of a capture envelope: asset descriptors plus remote state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEnvelope {
    /// Low resolution preview; always present.
    pub thumbnail: FileAsset,
    /// Full resolution still.
    #[serde(default)]
    pub closeup_asset: Option<FileAsset>,
    /// Raw video stream.
    #[serde(default)]
    pub video: Option<FileAsset>,
    /// Processed, download-ready video.
    #[serde(default)]
    pub download_video: Option<FileAsset>,
    /// Remote lifecycle state, passed through opaquely.
    #[serde(default)]
    pub state: String,
    #[serde(rename = "type", default)]
    pub capture_type: Option<RemoteCaptureType>,
}

impl CaptureEnvelope {
    /// Photo capture with only a thumbnail.
    pub fn photo(thumbnail: FileAsset) -> Self {
        Self {
            thumbnail,
            closeup_asset: None,
            video: None,
            download_video: None,
            state: String::new(),
            capture_type: Some(RemoteCaptureType::Photo),
        }
    }

    /// Video capture with a raw video asset.
    pub fn video(thumbnail: FileAsset, video: FileAsset) -> Self {
        Self {
            thumbnail,
            closeup_asset: None,
            video: Some(video),
            download_video: None,
            state: String::new(),
            capture_type: Some(RemoteCaptureType::Video),
        }
    }

    pub fn with_closeup(mut self, asset: FileAsset) -> Self {
        self.closeup_asset = Some(asset);
        self
    }

    pub fn with_download_video(mut self, asset: FileAsset) -> Self {
        self.download_video = Some(asset);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// A video descriptor of either variant classifies the capture as video.
    pub fn media_kind(&self) -> MediaKind {
        if self.video.is_some() || self.download_video.is_some() {
            MediaKind::Video
        } else {
            MediaKind::Photo
        }
    }
}

/// Tagged envelope payload.
///
/// Decoding is permissive: anything that does not parse as a
/// [`CaptureEnvelope`] becomes [`ContentPayload::Unknown`] instead of failing
/// the surrounding envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPayload {
    Capture(CaptureEnvelope),
    Unknown,
}

impl<'de> Deserialize<'de> for ContentPayload {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match CaptureEnvelope::deserialize(value) {
            Ok(capture) => ContentPayload::Capture(capture),
            Err(_) => ContentPayload::Unknown,
        })
    }
}

/// Remote wrapper around one content item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContentEnvelope {
    #[serde(rename = "uuid")]
    pub id: Uuid,
    pub data: ContentPayload,
    #[serde(deserialize_with = "wire_date::deserialize")]
    pub user_created_at: DateTime<Utc>,
    #[serde(deserialize_with = "wire_date::deserialize")]
    pub user_last_modified: DateTime<Utc>,
    #[serde(default)]
    pub origin_client_id: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub location: Option<String>,
}

impl MemoryContentEnvelope {
    pub fn new(id: Uuid, data: ContentPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            data,
            user_created_at: created_at,
            user_last_modified: created_at,
            origin_client_id: None,
            favorite: false,
            location: None,
        }
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_last_modified(mut self, modified_at: DateTime<Utc>) -> Self {
        self.user_last_modified = modified_at;
        self
    }

    /// Capture payload, if this envelope carries one.
    pub fn capture(&self) -> Option<&CaptureEnvelope> {
        match &self.data {
            ContentPayload::Capture(capture) => Some(capture),
            ContentPayload::Unknown => None,
        }
    }
}

/// One page of the remote listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentPage {
    pub items: Vec<MemoryContentEnvelope>,
    /// Total number of items across all pages.
    pub total_elements: u64,
}

/// Timestamp codec for the content service.
///
/// The service emits `yyyy-MM-dd'T'HH:mm:ss.SSSSSSX`, i.e. microsecond
/// precision with an ISO 8601 zone that may omit minutes (`+01`).
pub mod wire_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%#z")
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}

/// Remote content service.
///
/// Pages are zero-indexed. Asset downloads consume the asset's access token,
/// which must not be reused across calls.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Fetch one page of envelopes together with the remote total.
    async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<ContentPage>;

    /// Fetch a single envelope by id.
    async fn fetch_item(&self, id: Uuid) -> Result<MemoryContentEnvelope>;

    /// Download the bytes of one asset belonging to `item_id`.
    async fn download_asset(&self, item_id: Uuid, asset: &FileAsset) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTURE_JSON: &str = r#"{
        "uuid": "7b1e0c2a-4f5d-4c1b-9a51-6f2d0e8c9a10",
        "originClientId": "pin-1",
        "favorite": true,
        "userCreatedAt": "2024-03-01T10:00:00.123456Z",
        "userLastModified": "2024-03-02T11:30:00.000000+01",
        "data": {
            "state": "PROCESSED",
            "type": "PHOTO",
            "thumbnail": {
                "fileUUID": "0d9c1f8e-8a4e-4b7b-bb43-1c2f3a4b5c6d",
                "accessToken": "thumb-token"
            },
            "closeupAsset": {
                "fileUUID": "1e0d2f9f-9b5f-4c8c-8c54-2d3e4b5c6d7e",
                "accessToken": "closeup-token"
            }
        }
    }"#;

    #[test]
    fn test_decode_capture_envelope() {
        let envelope: MemoryContentEnvelope = serde_json::from_str(CAPTURE_JSON).unwrap();

        assert!(envelope.favorite);
        assert_eq!(envelope.origin_client_id.as_deref(), Some("pin-1"));
        let capture = envelope.capture().expect("capture payload");
        assert_eq!(capture.state, "PROCESSED");
        assert_eq!(capture.capture_type, Some(RemoteCaptureType::Photo));
        assert_eq!(capture.media_kind(), MediaKind::Photo);
        assert_eq!(
            capture.closeup_asset.as_ref().map(|a| a.access_token.as_str()),
            Some("closeup-token")
        );
        assert_eq!(
            envelope.user_last_modified,
            wire_date::parse("2024-03-02T10:30:00Z").unwrap()
        );
    }

    #[test]
    fn test_unrecognised_payload_decodes_as_unknown() {
        let json = r#"{
            "uuid": "7b1e0c2a-4f5d-4c1b-9a51-6f2d0e8c9a10",
            "favorite": false,
            "userCreatedAt": "2024-03-01T10:00:00.000000Z",
            "userLastModified": "2024-03-01T10:00:00.000000Z",
            "data": { "note": { "text": "buy milk" } }
        }"#;

        let envelope: MemoryContentEnvelope = serde_json::from_str(json).unwrap();

        assert_eq!(envelope.data, ContentPayload::Unknown);
        assert!(envelope.capture().is_none());
    }

    #[test]
    fn test_video_descriptor_classifies_as_video() {
        let thumb = FileAsset::new(Uuid::new_v4(), "t");
        let photo = CaptureEnvelope::photo(thumb.clone());
        let video = CaptureEnvelope::photo(thumb)
            .with_download_video(FileAsset::new(Uuid::new_v4(), "v"));

        assert_eq!(photo.media_kind(), MediaKind::Photo);
        assert_eq!(video.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_file_asset_debug_redacts_token() {
        let asset = FileAsset::new(Uuid::new_v4(), "super-secret");
        let rendered = format!("{:?}", asset);

        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_wire_date_rejects_garbage() {
        assert!(wire_date::parse("yesterday").is_err());
    }
}
