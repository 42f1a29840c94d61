//! # Core Configuration Module
//!
//! Builder-based configuration for the capture sync core.
//!
//! ## Overview
//!
//! [`CoreConfig`] holds every bridge and tuning knob the core needs. The
//! builder enforces fail-fast validation so a misconfigured host learns what is
//! missing at startup rather than in the middle of a sync pass.
//!
//! ## Required Dependencies
//!
//! - `MediaLibrary` - Album creation and asset writes
//! - `PermissionGate` - Photo library authorization
//! - A content source: either an injected `ContentService`, or an
//!   `HttpClient` plus access token for the built-in REST connector
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults are
//! injected for any bridge that is not provided: a reqwest `HttpClient`, a
//! directory-backed `MediaLibrary` under the user's Pictures folder and an
//! always-authorized `PermissionGate`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/captures.db")
//!     .access_token(token)
//!     .media_library(Arc::new(MyPhotoLibrary))
//!     .permission_gate(Arc::new(MyPermissionGate))
//!     .page_size(20)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Fails: no database path
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, ContentService, HttpClient, MediaLibrary, PermissionGate, RetryPolicy, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Album that receives synchronized media.
pub const DEFAULT_ALBUM_NAME: &str = "Ai Pin";

/// Base URL of the capture REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://webapi.prod.humane.cloud/";

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on items processed concurrently within one pass.
pub const DEFAULT_MAX_CONCURRENT_ITEMS: usize = 8;

pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Core configuration.
///
/// Construct with [`CoreConfig::builder`].
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite capture store
    pub database_path: PathBuf,

    /// Target album in the platform media library
    pub album_name: String,

    /// Base URL for the built-in REST connector
    pub api_base_url: String,

    /// Bearer token for the built-in REST connector
    pub access_token: Option<String>,

    /// Items requested per remote page
    pub page_size: u32,

    pub max_concurrent_items: usize,

    /// Retry policy for asset downloads and media writes
    pub retry_policy: RetryPolicy,

    /// Injected content source; when absent the REST connector is built from
    /// `http_client` and `access_token`
    pub content_service: Option<Arc<dyn ContentService>>,

    pub http_client: Option<Arc<dyn HttpClient>>,

    pub media_library: Arc<dyn MediaLibrary>,

    pub permission_gate: Arc<dyn PermissionGate>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("album_name", &self.album_name)
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("page_size", &self.page_size)
            .field("max_concurrent_items", &self.max_concurrent_items)
            .field("retry_policy", &self.retry_policy)
            .field(
                "content_service",
                &self
                    .content_service
                    .as_ref()
                    .map(|_| "ContentService { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("media_library", &"MediaLibrary { ... }")
            .field("permission_gate", &"PermissionGate { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate settings and bridge combinations.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.album_name.trim().is_empty() {
            return Err(Error::Config("Album name cannot be empty".to_string()));
        }

        if self.page_size == 0 {
            return Err(Error::Config(
                "Page size must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_items == 0 {
            return Err(Error::Config(
                "Max concurrent items must be greater than 0".to_string(),
            ));
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "Retry attempts must be at least 1 (1 disables retries)".to_string(),
            ));
        }

        if self.retry_policy.base_delay > self.retry_policy.max_delay {
            return Err(Error::Config(
                "Retry base delay cannot exceed the maximum delay".to_string(),
            ));
        }

        if self.content_service.is_none() {
            if self.http_client.is_none() {
                return Err(http_client_missing_error());
            }

            if self.api_base_url.trim().is_empty() {
                return Err(Error::Config("API base URL cannot be empty".to_string()));
            }

            let has_token = self
                .access_token
                .as_deref()
                .is_some_and(|token| !token.trim().is_empty());
            if !has_token {
                return Err(Error::capability_missing(
                    "AccessToken",
                    "An access token is required for the built-in capture connector. \
                     Use .access_token() or inject a ContentService.",
                ));
            }
        }

        Ok(())
    }
}

fn http_client_missing_error() -> Error {
    Error::capability_missing(
        "HttpClient",
        "No ContentService was injected, so an HttpClient is required for the built-in \
                 capture connector. Desktop: enable the 'desktop-shims' feature to use the default \
                 ReqwestHttpClient. Mobile: inject a platform HttpClient or a ContentService.",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn media_library_missing_error() -> Error {
    Error::capability_missing(
        "MediaLibrary",
        "MediaLibrary implementation is required to persist captures. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DirectoryMediaLibrary. \
                 Mobile: inject the platform photo library bridge.",
    )
}

#[cfg(not(feature = "desktop-shims"))]
fn permission_gate_missing_error() -> Error {
    Error::capability_missing(
        "PermissionGate",
        "PermissionGate implementation is required to authorize media writes. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default StaticPermissionGate. \
                 Mobile: inject the platform photo library authorization bridge.",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_library() -> Result<Arc<dyn MediaLibrary>> {
    use bridge_desktop::DirectoryMediaLibrary;

    let library = DirectoryMediaLibrary::in_pictures_dir().map_err(|e| {
        Error::capability_missing(
            "MediaLibrary",
            format!(
                "Could not locate a Pictures directory for the default DirectoryMediaLibrary: {}. \
                 Inject a MediaLibrary explicitly.",
                e
            ),
        )
    })?;
    let library: Arc<dyn MediaLibrary> = Arc::new(library);
    Ok(library)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_library() -> Result<Arc<dyn MediaLibrary>> {
    Err(media_library_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_permission_gate() -> Result<Arc<dyn PermissionGate>> {
    use bridge_desktop::StaticPermissionGate;

    let gate: Arc<dyn PermissionGate> = Arc::new(StaticPermissionGate::authorized());
    Ok(gate)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_permission_gate() -> Result<Arc<dyn PermissionGate>> {
    Err(permission_gate_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Some(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    album_name: Option<String>,
    api_base_url: Option<String>,
    access_token: Option<String>,
    page_size: Option<u32>,
    max_concurrent_items: Option<usize>,
    retry_max_attempts: Option<u32>,
    retry_base_delay: Option<Duration>,
    retry_max_delay: Option<Duration>,
    content_service: Option<Arc<dyn ContentService>>,
    http_client: Option<Arc<dyn HttpClient>>,
    media_library: Option<Arc<dyn MediaLibrary>>,
    permission_gate: Option<Arc<dyn PermissionGate>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn album_name(mut self, name: impl Into<String>) -> Self {
        self.album_name = Some(name.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn max_concurrent_items(mut self, limit: usize) -> Self {
        self.max_concurrent_items = Some(limit);
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.retry_max_attempts = Some(attempts);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.retry_max_delay = Some(delay);
        self
    }

    pub fn content_service(mut self, service: Arc<dyn ContentService>) -> Self {
        self.content_service = Some(service);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn media_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.media_library = Some(library);
        self
    }

    pub fn permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.permission_gate = Some(gate);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` for a missing database path or out-of-range settings
    /// - `Error::CapabilityMissing` when a required bridge is absent and no
    ///   platform default is available
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let media_library = match self.media_library {
            Some(library) => library,
            None => provide_default_media_library()?,
        };

        let permission_gate = match self.permission_gate {
            Some(gate) => gate,
            None => provide_default_permission_gate()?,
        };

        // The HTTP client only matters when the built-in connector is used.
        let http_client = match (&self.content_service, self.http_client) {
            (_, Some(client)) => Some(client),
            (None, None) => provide_default_http_client(),
            (Some(_), None) => None,
        };

        let retry_policy = RetryPolicy {
            max_attempts: self.retry_max_attempts.unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS),
            base_delay: self.retry_base_delay.unwrap_or(DEFAULT_RETRY_BASE_DELAY),
            max_delay: self.retry_max_delay.unwrap_or(DEFAULT_RETRY_MAX_DELAY),
            use_exponential_backoff: true,
        };

        let config = CoreConfig {
            database_path,
            album_name: self
                .album_name
                .unwrap_or_else(|| DEFAULT_ALBUM_NAME.to_string()),
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            access_token: self.access_token,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_concurrent_items: self
                .max_concurrent_items
                .unwrap_or(DEFAULT_MAX_CONCURRENT_ITEMS),
            retry_policy,
            content_service: self.content_service,
            http_client,
            media_library,
            permission_gate,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        AlbumHandle, AuthorizationStatus, ContentPage, FileAsset, HttpRequest, HttpResponse,
        MediaKind, MemoryContentEnvelope,
    };
    use bytes::Bytes;
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    struct NullLibrary;

    #[async_trait]
    impl MediaLibrary for NullLibrary {
        async fn ensure_album(&self, name: &str) -> BridgeResult<AlbumHandle> {
            Ok(AlbumHandle::new("album", name))
        }

        async fn list_filenames(&self, _album: &AlbumHandle) -> BridgeResult<HashSet<String>> {
            Ok(HashSet::new())
        }

        async fn write_asset(
            &self,
            _album: &AlbumHandle,
            _bytes: Bytes,
            _filename: &str,
            _kind: MediaKind,
            _creation_date: DateTime<Utc>,
        ) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct AllowAll;

    #[async_trait]
    impl PermissionGate for AllowAll {
        async fn query_authorization(&self) -> BridgeResult<AuthorizationStatus> {
            Ok(AuthorizationStatus::Authorized)
        }

        async fn request_authorization(&self) -> BridgeResult<AuthorizationStatus> {
            Ok(AuthorizationStatus::Authorized)
        }
    }

    struct NullContent;

    #[async_trait]
    impl ContentService for NullContent {
        async fn fetch_page(&self, _page: u32, _size: u32) -> BridgeResult<ContentPage> {
            Ok(ContentPage::default())
        }

        async fn fetch_item(&self, id: Uuid) -> BridgeResult<MemoryContentEnvelope> {
            Err(bridge_traits::BridgeError::NotFound(id.to_string()))
        }

        async fn download_asset(&self, _item: Uuid, _asset: &FileAsset) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }
    }

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(bridge_traits::BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .database_path("/data/captures.db")
            .media_library(Arc::new(NullLibrary))
            .permission_gate(Arc::new(AllowAll))
    }

    #[test]
    fn test_builder_defaults() {
        let config = with_bridges()
            .content_service(Arc::new(NullContent))
            .build()
            .unwrap();

        assert_eq!(config.album_name, "Ai Pin");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.max_concurrent_items, 8);
        assert_eq!(config.retry_policy.max_attempts, 3);
        assert_eq!(config.retry_policy.base_delay, Duration::from_millis(500));
        assert_eq!(config.retry_policy.max_delay, Duration::from_secs(10));
        assert!(config.http_client.is_none());
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder()
            .media_library(Arc::new(NullLibrary))
            .permission_gate(Arc::new(AllowAll))
            .content_service(Arc::new(NullContent))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Database path is required"));
    }

    #[test]
    fn test_builder_requires_token_for_builtin_connector() {
        let result = with_bridges().http_client(Arc::new(NullHttp)).build();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "AccessToken"));

        let config = with_bridges()
            .http_client(Arc::new(NullHttp))
            .access_token("token")
            .build()
            .unwrap();
        assert!(config.content_service.is_none());
        assert!(config.http_client.is_some());
    }

    #[test]
    fn test_builder_rejects_zero_values() {
        let base = || with_bridges().content_service(Arc::new(NullContent));

        assert!(base().page_size(0).build().unwrap_err().to_string().contains("Page size"));
        assert!(base()
            .max_concurrent_items(0)
            .build()
            .unwrap_err()
            .to_string()
            .contains("Max concurrent items"));
        assert!(base()
            .retry_max_attempts(0)
            .build()
            .unwrap_err()
            .to_string()
            .contains("Retry attempts"));
        assert!(base()
            .album_name("  ")
            .build()
            .unwrap_err()
            .to_string()
            .contains("Album name"));
        assert!(base()
            .database_path("")
            .build()
            .unwrap_err()
            .to_string()
            .contains("Database path cannot be empty"));
    }

    #[test]
    fn test_builder_rejects_inverted_retry_delays() {
        let result = with_bridges()
            .content_service(Arc::new(NullContent))
            .retry_base_delay(Duration::from_secs(30))
            .retry_max_delay(Duration::from_secs(1))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let config = with_bridges()
            .http_client(Arc::new(NullHttp))
            .access_token("very-secret-token")
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_media_library() {
        let result = CoreConfig::builder()
            .database_path("/data/captures.db")
            .permission_gate(Arc::new(AllowAll))
            .content_service(Arc::new(NullContent))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("MediaLibrary"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_content_service() {
        let result = with_bridges().access_token("token").build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("HttpClient"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_http_client() {
        let config = with_bridges().access_token("token").build().unwrap();
        assert!(config.http_client.is_some());
    }
}
