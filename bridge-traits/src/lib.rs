//! # Host Bridge Traits
//!
//! Contracts between the capture synchronization core and the collaborators
//! it drives.
//!
//! ## Overview
//!
//! The core never talks to the network, the photo library or the permission
//! prompt directly. Each of those is a trait defined here and implemented per
//! platform (desktop adapters live in `bridge-desktop`, the REST connector in
//! `provider-humane`, mobile hosts inject their own).
//!
//! ## Traits
//!
//! ### Remote Content
//! - [`ContentService`](content::ContentService) - Paginated envelope listing, single item fetch, asset download
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport used by connectors
//!
//! ### Platform Media
//! - [`MediaLibrary`](media::MediaLibrary) - Album creation, filename listing, asset writes
//! - [`PermissionGate`](permission::PermissionGate) - Photo library authorization
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert native errors into it and include enough
//! context (status codes, paths) to act on.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so the sync engine can call them
//! from concurrently running item tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::content::{ContentPage, ContentService, FileAsset, MemoryContentEnvelope};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! struct FixtureService;
//!
//! #[async_trait]
//! impl ContentService for FixtureService {
//!     async fn fetch_page(&self, _page: u32, _size: u32) -> Result<ContentPage> {
//!         Ok(ContentPage::default())
//!     }
//!     // ...
//! }
//! ```

pub mod content;
pub mod error;
pub mod http;
pub mod media;
pub mod permission;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use content::{
    CaptureEnvelope, ContentPage, ContentPayload, ContentService, FileAsset,
    MemoryContentEnvelope, RemoteCaptureType,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{AlbumHandle, MediaKind, MediaLibrary};
pub use permission::{AuthorizationStatus, PermissionGate};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
