//! Media Library Implementation backed by a directory tree
//!
//! Each album is a subdirectory of the library root and each asset a file in
//! it. Writes land in a hidden temporary file first and are renamed into place,
//! so a listing never reports a partially written asset.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{AlbumHandle, MediaKind, MediaLibrary},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Prefix of in-flight writes; such files are never listed.
const PARTIAL_PREFIX: &str = ".partial-";

/// Directory-based media library for desktop hosts
pub struct DirectoryMediaLibrary {
    root: PathBuf,
}

impl DirectoryMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Library rooted at the user's Pictures directory
    pub fn in_pictures_dir() -> Result<Self> {
        dirs::picture_dir()
            .map(Self::new)
            .ok_or_else(|| BridgeError::NotAvailable("pictures directory".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that would escape their parent directory.
    fn validate_component(kind: &str, name: &str) -> Result<()> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || name.starts_with(PARTIAL_PREFIX);
        if invalid {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid {} name: {:?}",
                kind, name
            )));
        }
        Ok(())
    }

    /// Write `bytes` to `partial`, stamp the capture time, then move it into
    /// place. Leaves `partial` behind on error.
    async fn write_then_rename(
        partial: &Path,
        target: &Path,
        bytes: &[u8],
        creation_date: DateTime<Utc>,
    ) -> std::io::Result<()> {
        let mut file = fs::File::create(partial).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;

        // Directories have no creation-date metadata; the modification time
        // carries the capture time instead.
        let file = file.into_std().await;
        if let Err(e) = file.set_modified(SystemTime::from(creation_date)) {
            warn!(error = %e, "Could not set capture time on file");
        }
        drop(file);

        fs::rename(partial, target).await
    }
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    async fn ensure_album(&self, name: &str) -> Result<AlbumHandle> {
        Self::validate_component("album", name)?;

        let path = self.root.join(name);
        fs::create_dir_all(&path).await?;
        debug!(album = name, "Album directory ready");

        Ok(AlbumHandle::new(path.to_string_lossy(), name))
    }

    async fn list_filenames(&self, album: &AlbumHandle) -> Result<HashSet<String>> {
        let mut entries = fs::read_dir(&album.id).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotFound(format!("album {}", album.name))
            } else {
                BridgeError::Io(e)
            }
        })?;

        let mut filenames = HashSet::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(PARTIAL_PREFIX) {
                filenames.insert(name);
            }
        }
        Ok(filenames)
    }

    async fn write_asset(
        &self,
        album: &AlbumHandle,
        bytes: Bytes,
        filename: &str,
        kind: MediaKind,
        creation_date: DateTime<Utc>,
    ) -> Result<()> {
        Self::validate_component("file", filename)?;

        let dir = PathBuf::from(&album.id);
        let target = dir.join(filename);
        let partial = dir.join(format!("{}{}", PARTIAL_PREFIX, filename));

        if let Err(e) = Self::write_then_rename(&partial, &target, &bytes, creation_date).await {
            if let Err(cleanup) = fs::remove_file(&partial).await {
                debug!(filename, error = %cleanup, "No partial file to remove");
            }
            return Err(e.into());
        }
        debug!(filename, %kind, size = bytes.len(), "Wrote asset");
        Ok(())
    }
}
