//! # Sync Progress
//!
//! Observable pass state shared between the reconciler and UI observers.
//!
//! Counters are updated with atomics from concurrent item completions and every
//! change is republished on a [`tokio::sync::watch`] channel. Observers read
//! either the latest [`SyncProgress`] snapshot or subscribe to changes; nothing
//! outside this crate can mutate the state.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// Point-in-time view of the sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncProgress {
    pub is_syncing: bool,
    pub total_to_sync: u64,
    pub synced_count: u64,
    pub has_media_permission: bool,
}

impl SyncProgress {
    /// Completion ratio in `[0.0, 1.0]`; zero while idle.
    pub fn fraction(&self) -> f64 {
        if self.total_to_sync == 0 {
            0.0
        } else {
            (self.synced_count as f64 / self.total_to_sync as f64).min(1.0)
        }
    }
}

/// Thread-safe progress state for reconciliation passes.
pub struct ProgressTracker {
    syncing: AtomicBool,
    total: AtomicU64,
    synced: AtomicU64,
    has_permission: AtomicBool,
    sender: watch::Sender<SyncProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SyncProgress::default());
        Self {
            syncing: AtomicBool::new(false),
            total: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            has_permission: AtomicBool::new(false),
            sender,
        }
    }

    pub fn snapshot(&self) -> SyncProgress {
        SyncProgress {
            is_syncing: self.syncing.load(Ordering::SeqCst),
            total_to_sync: self.total.load(Ordering::SeqCst),
            synced_count: self.synced.load(Ordering::SeqCst),
            has_media_permission: self.has_permission.load(Ordering::SeqCst),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.sender.subscribe()
    }

    pub fn has_media_permission(&self) -> bool {
        self.has_permission.load(Ordering::SeqCst)
    }

    pub(crate) fn set_media_permission(&self, granted: bool) {
        self.has_permission.store(granted, Ordering::SeqCst);
        self.publish();
    }

    /// Enter the syncing state with zeroed counters.
    pub(crate) fn begin(&self) {
        self.synced.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        self.syncing.store(true, Ordering::SeqCst);
        self.publish();
    }

    /// Reset counters to `{synced: 0, total}` for the item phase.
    pub(crate) fn reset(&self, total: u64) {
        self.synced.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.publish();
    }

    /// Record one attempted item and return the new synced count.
    pub(crate) fn increment(&self) -> u64 {
        let synced = self.synced.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish();
        synced
    }

    /// Return to idle with zero progress.
    pub(crate) fn finish(&self) {
        self.syncing.store(false, Ordering::SeqCst);
        self.synced.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        self.publish();
    }

    fn publish(&self) {
        self.sender.send_replace(self.snapshot());
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
