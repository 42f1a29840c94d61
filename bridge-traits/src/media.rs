//! Platform Media Store Abstraction
//!
//! The photo-library analogue the sync engine writes downloaded captures into.
//! Hosts implement [`MediaLibrary`] over their native store (PhotoKit,
//! MediaStore, a directory tree on desktop).

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;

/// Kind of media a capture resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    /// File extension used for library filenames.
    pub fn file_extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to an album in the host media store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumHandle {
    /// Host-specific identifier (local identifier, directory path, ...)
    pub id: String,
    /// Display name the album was created with
    pub name: String,
}

impl AlbumHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Host media store.
///
/// # Example
///
/// ```ignore
/// let album = library.ensure_album("Ai Pin").await?;
/// if !library.list_filenames(&album).await?.contains("7b1e.jpg") {
///     library
///         .write_asset(&album, bytes, "7b1e.jpg", MediaKind::Photo, created_at)
///         .await?;
/// }
/// ```
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Return the album with the given name, creating it if needed.
    async fn ensure_album(&self, name: &str) -> Result<AlbumHandle>;

    /// Filenames of every asset currently in the album.
    async fn list_filenames(&self, album: &AlbumHandle) -> Result<HashSet<String>>;

    /// Write a new asset into the album.
    ///
    /// `creation_date` is the author-supplied capture time and should become
    /// the asset's creation date where the host supports it.
    async fn write_asset(
        &self,
        album: &AlbumHandle,
        bytes: Bytes,
        filename: &str,
        kind: MediaKind,
        creation_date: DateTime<Utc>,
    ) -> Result<()>;
}
