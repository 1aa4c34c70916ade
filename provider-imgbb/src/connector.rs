//! ImgBB upload API connector

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::upload::{ContentKind, MediaSource, MediaUploader};
use core_runtime::config::ImgbbConfig;
use core_runtime::logging::{redact_if_sensitive, strip_query};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{ImgbbError, Result};
use crate::types::{ErrorResponse, UploadForm, UploadResponse};

const API_BASE: &str = "https://api.imgbb.com/1";

/// ImgBB connector
///
/// Only accepts [`ContentKind::Image`]; video thumbnails are images too.
pub struct ImgbbConnector {
    http_client: Arc<dyn HttpClient>,
    config: ImgbbConfig,
    base_url: String,
}

impl ImgbbConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ImgbbConfig) -> Self {
        Self {
            http_client,
            config,
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/upload?key={}", self.base_url, self.config.api_key)
    }

    fn build_form(&self, source: &MediaSource) -> Result<UploadForm> {
        if let MediaSource::Bytes { content_type, .. } = source {
            if !content_type.starts_with("image/") {
                return Err(ImgbbError::Unsupported(content_type.clone()));
            }
        }

        Ok(UploadForm {
            image: source.to_url_or_base64(),
            name: source.fingerprint(),
            expiration: self.config.expiration_secs,
        })
    }

    fn parse_error(response: &HttpResponse) -> String {
        serde_json::from_slice::<ErrorResponse>(&response.body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", response.status))
    }

    /// Upload and return the `data.url` locator.
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub async fn upload_source(&self, source: &MediaSource) -> Result<String> {
        let form = self.build_form(source)?;
        let url = self.upload_url();

        debug!(
            endpoint = %strip_query(&url),
            api_key = %redact_if_sensitive("api_key", &self.config.api_key),
            "Uploading to secondary provider"
        );

        let request = HttpRequest::post(url)
            .header("Accept", "application/json")
            .form(&form)?
            .timeout(Duration::from_secs(60));

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(ImgbbError::ApiError {
                status_code: response.status,
                message: Self::parse_error(&response),
            });
        }

        let parsed: UploadResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ImgbbError::ParseError(e.to_string()))?;

        if !parsed.success {
            return Err(ImgbbError::ApiError {
                status_code: response.status,
                message: "upload reported success=false".to_string(),
            });
        }

        let locator = parsed
            .data
            .and_then(|data| data.url.or(data.display_url))
            .filter(|url| !url.is_empty())
            .ok_or(ImgbbError::MissingLocator)?;

        info!(locator = %locator, "Stored media on secondary provider");
        Ok(locator)
    }
}

#[async_trait]
impl MediaUploader for ImgbbConnector {
    fn name(&self) -> &str {
        "imgbb"
    }

    fn accepts(&self, kind: ContentKind) -> bool {
        kind == ContentKind::Image
    }

    async fn upload(&self, source: &MediaSource) -> bridge_traits::error::Result<String> {
        Ok(self.upload_source(source).await?)
    }
}
