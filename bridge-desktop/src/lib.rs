//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `MediaLibrary` as album directories under a root (default: the user's
//!   Pictures directory) using `tokio::fs`
//! - `PermissionGate` with a static answer (desktop has no photo prompt)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectoryMediaLibrary, ReqwestHttpClient, StaticPermissionGate};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new());
//! let library = Arc::new(DirectoryMediaLibrary::in_pictures_dir()?);
//! let gate = Arc::new(StaticPermissionGate::authorized());
//! ```

mod http;
mod media_library;
mod permission;

pub use http::ReqwestHttpClient;
pub use media_library::DirectoryMediaLibrary;
pub use permission::StaticPermissionGate;
