//! Cloudinary upload API connector
//!
//! Implements `MediaUploader` against the unsigned `auto/upload` endpoint.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::upload::{MediaSource, MediaUploader};
use core_async::time::{sleep, Duration};
use core_runtime::config::CloudinaryConfig;
use core_runtime::logging::strip_query;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{CloudinaryError, Result};
use crate::types::{ErrorResponse, UploadForm, UploadResponse};

/// Cloudinary API base URL
const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Attempts per upload, including the first
const MAX_ATTEMPTS: u32 = 3;

/// Cloudinary connector
///
/// # Example
///
/// ```ignore
/// use provider_cloudinary::CloudinaryConnector;
/// use bridge_traits::upload::{MediaSource, MediaUploader};
///
/// let connector = CloudinaryConnector::new(http_client, config);
/// let locator = connector.upload(&MediaSource::url(cdn_url)).await?;
/// ```
pub struct CloudinaryConnector {
    http_client: Arc<dyn HttpClient>,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: CloudinaryConfig) -> Self {
        Self {
            http_client,
            config,
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the connector at another API host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", self.base_url, self.config.cloud_name)
    }

    fn build_form(&self, source: &MediaSource) -> UploadForm {
        UploadForm {
            file: source.to_uri(),
            upload_preset: self.config.upload_preset.clone(),
            folder: self.config.folder.clone(),
            public_id: source.fingerprint(),
        }
    }

    fn parse_error(response: &HttpResponse) -> String {
        serde_json::from_slice::<ErrorResponse>(&response.body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", response.status))
    }

    /// POST the form, backing off on 429 and 5xx.
    #[instrument(skip(self, form), fields(public_id = %form.public_id))]
    async fn post_with_retry(&self, form: &UploadForm) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let request = HttpRequest::post(self.upload_url())
                .header("Accept", "application/json")
                .form(form)?
                .timeout(Duration::from_secs(60));

            let response = self.http_client.execute(request).await?;
            let status = response.status;

            if response.is_success() {
                debug!(status, "Upload request succeeded");
                return Ok(response);
            }

            if status == 429 || response.is_server_error() {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    warn!(status, attempts = attempt, "Upload failed after retries");
                    return Err(if status == 429 {
                        CloudinaryError::RateLimitExceeded { attempts: attempt }
                    } else {
                        CloudinaryError::ApiError {
                            status_code: status,
                            message: Self::parse_error(&response),
                        }
                    });
                }

                let delay = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                debug!(status, attempt, delay_ms = delay.as_millis() as u64, "Retrying upload");
                sleep(delay).await;
                continue;
            }

            return Err(CloudinaryError::ApiError {
                status_code: status,
                message: Self::parse_error(&response),
            });
        }
    }

    /// Upload and return the `secure_url` locator.
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub async fn upload_source(&self, source: &MediaSource) -> Result<String> {
        let form = self.build_form(source);
        let response = self.post_with_retry(&form).await?;

        let parsed: UploadResponse = serde_json::from_slice(&response.body)
            .map_err(|e| CloudinaryError::ParseError(e.to_string()))?;

        let locator = parsed
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or(CloudinaryError::MissingLocator)?;

        info!(
            locator = %strip_query(&locator),
            resource_type = parsed.resource_type.as_deref().unwrap_or("unknown"),
            "Stored media on primary provider"
        );
        Ok(locator)
    }
}

#[async_trait]
impl MediaUploader for CloudinaryConnector {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, source: &MediaSource) -> bridge_traits::error::Result<String> {
        Ok(self.upload_source(source).await?)
    }
}
