//! Humane Center API connector implementation
//!
//! Implements the `ContentService` trait over the capture REST endpoints.

use async_trait::async_trait;
use bridge_traits::content::{ContentPage, ContentService, FileAsset, MemoryContentEnvelope};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::HumaneError;
use crate::types::PageableContentEnvelope;

/// Listing order: newest captures first
const CAPTURE_SORT: &str = "userCreatedAt,DESC";

const API_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Humane Center API connector
///
/// # Features
///
/// - Paginated capture listing (`capture/captures`)
/// - Single memory lookup (`capture/memory/{uuid}`)
/// - Asset download with the asset's own access token
/// - Exponential backoff for 429 and 5xx responses on page listings
///
/// Item lookups and downloads make a single attempt. Download URLs carry a
/// single-use token, so their callers retry by re-reading the item.
///
/// # Example
///
/// ```ignore
/// use provider_humane::HumaneCenterConnector;
/// use bridge_traits::content::ContentService;
///
/// let connector = HumaneCenterConnector::new(http_client, "https://webapi.prod.humane.cloud/", token);
/// let page = connector.fetch_page(0, 20).await?;
/// println!("{} captures in total", page.total_elements);
/// ```
pub struct HumaneCenterConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    access_token: String,
    retry_policy: RetryPolicy,
}

impl HumaneCenterConnector {
    /// Create a connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - API root, e.g. `https://webapi.prod.humane.cloud/`
    /// * `access_token` - Bearer token for the signed-in account
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            http_client,
            base_url,
            access_token: access_token.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, timeout: Duration) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.endpoint(path))
            .bearer_token(&self.access_token)
            .header("Accept", "application/json")
            .timeout(timeout)
    }

    /// Execute a request, retrying rate limits, server errors and transport
    /// failures with exponential backoff, up to `max_attempts` in total.
    ///
    /// `operation` labels log lines; URLs are not logged since download URLs
    /// carry an access token.
    #[instrument(skip(self, request))]
    async fn execute_with_retry(
        &self,
        operation: &str,
        request: HttpRequest,
        max_attempts: u32,
    ) -> std::result::Result<HttpResponse, HumaneError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "API request succeeded");
                    return Ok(response);
                }
                Ok(response) if response.status == 429 || response.is_server_error() => {
                    HumaneError::ApiError {
                        status_code: response.status,
                        message: String::from_utf8_lossy(&response.body).to_string(),
                    }
                }
                Ok(response) => {
                    warn!(status = response.status, "API request rejected");
                    return Err(HumaneError::ApiError {
                        status_code: response.status,
                        message: String::from_utf8_lossy(&response.body).to_string(),
                    });
                }
                Err(e) => HumaneError::NetworkError(e.to_string()),
            };

            if attempt >= max_attempts {
                warn!("API request failed after {} attempts: {}", attempt, failure);
                return Err(failure);
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            warn!(
                "API request failed (attempt {}/{}): {}, retrying in {}ms",
                attempt,
                max_attempts,
                failure,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ContentService for HumaneCenterConnector {
    #[instrument(skip(self))]
    async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<ContentPage> {
        let request = self
            .get("capture/captures", API_TIMEOUT)
            .query("page", &page_index.to_string())
            .query("size", &page_size.to_string())
            .query("sort", CAPTURE_SORT)
            .query("onlyContainingFavorited", "false");

        let response = self
            .execute_with_retry("list_captures", request, self.retry_policy.max_attempts)
            .await?;

        let page: PageableContentEnvelope = serde_json::from_slice(&response.body)
            .map_err(|e| HumaneError::ParseError(format!("Failed to parse capture page: {}", e)))?;

        info!(
            items = page.content.len(),
            total = page.total_elements,
            "Listed captures"
        );
        Ok(page.into())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_item(&self, id: Uuid) -> Result<MemoryContentEnvelope> {
        let request = self.get(&format!("capture/memory/{}", id), API_TIMEOUT);
        let response = self.execute_with_retry("get_memory", request, 1).await?;

        let envelope: MemoryContentEnvelope = serde_json::from_slice(&response.body)
            .map_err(|e| HumaneError::ParseError(format!("Failed to parse memory: {}", e)))?;
        Ok(envelope)
    }

    #[instrument(skip(self, asset), fields(item_id = %item_id, file_id = %asset.file_id))]
    async fn download_asset(&self, item_id: Uuid, asset: &FileAsset) -> Result<Bytes> {
        let request = self
            .get(
                &format!("capture/memory/{}/file/{}/download", item_id, asset.file_id),
                DOWNLOAD_TIMEOUT,
            )
            .header("Accept", "*/*")
            .query("token", &asset.access_token)
            .query("rawData", "false");

        let response = self
            .execute_with_retry("download_asset", request, 1)
            .await?;

        info!("Downloaded {} bytes", response.body.len());
        Ok(response.body)
    }
}
