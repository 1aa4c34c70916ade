//! Mobile endpoint strategy

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExtractionConfig;
use serde_json::Value;
use std::sync::Arc;

use super::{fetch, ExtractionStrategy};
use crate::error::StrategyFailure;
use crate::model::ExtractedPost;
use crate::parse::{find_post_node, normalize_mobile_item, PostNode};
use crate::reference::PostReference;

const NAME: &str = "mobile_api";

const MOBILE_API_BASE: &str = "https://i.instagram.com/api/v1";

/// Requests the media info document the mobile app uses.
pub struct MobileApiStrategy {
    http_client: Arc<dyn HttpClient>,
    config: ExtractionConfig,
    base_url: String,
}

impl MobileApiStrategy {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ExtractionConfig) -> Self {
        Self {
            http_client,
            config,
            base_url: MOBILE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ExtractionStrategy for MobileApiStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure> {
        let media_id = reference
            .media_id()
            .ok_or_else(|| StrategyFailure::new(NAME, "shortcode does not decode to a media id"))?;

        let request = HttpRequest::get(format!("{}/media/{}/info/", self.base_url, media_id))
            .user_agent(&self.config.mobile_user_agent)
            .header("X-IG-App-ID", &self.config.web_app_id);

        let response = fetch(self.http_client.as_ref(), NAME, request).await?;
        let body: Value = response
            .json()
            .map_err(|_| StrategyFailure::new(NAME, "response is not structured data"))?;

        let item = match find_post_node(&body) {
            Some(PostNode::Mobile(item)) => item,
            _ => return Err(StrategyFailure::new(NAME, "no media item")),
        };

        let post = normalize_mobile_item(item, reference);
        if !post.has_media() {
            return Err(StrategyFailure::new(NAME, "item has no media"));
        }
        Ok(post)
    }
}
