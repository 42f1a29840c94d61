//! # Capture Sync Engine
//!
//! Reconciles the remote capture collection with the local store and the
//! platform media library.
//!
//! ## Overview
//!
//! A reconciliation pass probes the remote total, gates on media library
//! permission, fetches every page concurrently, persists each capture's media
//! into the target album and finally removes local records the remote no
//! longer reports.
//!
//! ## Components
//!
//! - **Capture Reconciler** (`reconciler`): Runs passes, owns cancellation and the single-pass lock
//! - **Media Pipeline** (`pipeline`): Asset resolution, download and idempotent album writes
//! - **Album Filename Cache** (`album_cache`): Rebuildable index of filenames already in the album
//! - **Progress Tracker** (`progress`): Atomic counters published over a watch channel
//! - **Permission Coordinator** (`permission`): Lazily resolved media library authorization
//! - **Retry** (`retry`): Bounded retry of transient pipeline failures

pub mod album_cache;
pub mod error;
pub mod permission;
pub mod pipeline;
pub mod progress;
pub mod reconciler;
pub mod retry;

pub use album_cache::AlbumFilenameCache;
pub use error::{PipelineError, Result, SyncError};
pub use permission::PermissionCoordinator;
pub use pipeline::{resolve_asset, ExportedMedia, MediaPipeline, PersistOutcome, ResolvedAsset};
pub use progress::{ProgressTracker, SyncProgress};
pub use reconciler::{page_count, CaptureReconciler, SyncConfig, SyncReport};
pub use retry::retry_pipeline;

pub use tokio_util::sync::CancellationToken;
