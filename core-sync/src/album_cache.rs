//! # Album Filename Cache
//!
//! Index of filenames already present in the target album. It is derived
//! state: the media library is the source of truth and the cache is rebuilt
//! from the live album listing whenever it is cold.
//!
//! Access is serialized through a mutex that is never held across a call into
//! the media library. Warming happens outside the lock and the first completed
//! listing is installed; concurrent warmers simply discard their copy.
//!
//! A name enters the set when a writer reserves it, before any bytes move.
//! Failed writes release the name again.

use bridge_traits::error::Result;
use bridge_traits::media::{AlbumHandle, MediaLibrary};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct WarmAlbum {
    handle: AlbumHandle,
    filenames: HashSet<String>,
}

pub struct AlbumFilenameCache {
    library: Arc<dyn MediaLibrary>,
    album_name: String,
    state: Mutex<Option<WarmAlbum>>,
}

impl AlbumFilenameCache {
    pub fn new(library: Arc<dyn MediaLibrary>, album_name: impl Into<String>) -> Self {
        Self {
            library,
            album_name: album_name.into(),
            state: Mutex::new(None),
        }
    }

    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    /// Drop the cached listing so the next lookup re-reads the album.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    /// Album handle, creating the album on first use.
    pub async fn album(&self) -> Result<AlbumHandle> {
        self.with_warm(|warm| warm.handle.clone()).await
    }

    /// Claim `filename` for a write.
    ///
    /// Returns `false` when the album already holds the file or another task
    /// has claimed it. Check and claim happen under one lock acquisition, so
    /// exactly one caller wins a given name.
    pub async fn reserve(&self, filename: &str) -> Result<bool> {
        self.with_warm(|warm| warm.filenames.insert(filename.to_string()))
            .await
    }

    /// Give back a claim whose write did not land.
    pub async fn release(&self, filename: &str) {
        if let Some(warm) = self.state.lock().await.as_mut() {
            warm.filenames.remove(filename);
        }
    }

    async fn with_warm<R>(&self, f: impl FnOnce(&mut WarmAlbum) -> R) -> Result<R> {
        {
            let mut state = self.state.lock().await;
            if let Some(warm) = state.as_mut() {
                return Ok(f(warm));
            }
        }

        let handle = self.library.ensure_album(&self.album_name).await?;
        let filenames = self.library.list_filenames(&handle).await?;
        debug!(
            album = %self.album_name,
            files = filenames.len(),
            "Warmed album filename cache"
        );

        let mut state = self.state.lock().await;
        Ok(f(state.get_or_insert(WarmAlbum { handle, filenames })))
    }
}
