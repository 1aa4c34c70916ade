//! Embedded view strategy
//!
//! The embeddable rendering is lighter and less guarded than the full page.
//! Inline structured data is preferred; without it the raw markup is scanned
//! for CDN media URLs.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExtractionConfig;
use std::sync::Arc;
use tracing::debug;

use super::{body_text, fetch, ExtractionStrategy};
use crate::error::StrategyFailure;
use crate::model::ExtractedPost;
use crate::parse::{scan_media_urls, HtmlPostParser, PostParser};
use crate::reference::PostReference;

const NAME: &str = "embed";

pub struct EmbedStrategy {
    http_client: Arc<dyn HttpClient>,
    parser: Arc<dyn PostParser>,
    config: ExtractionConfig,
}

impl EmbedStrategy {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ExtractionConfig) -> Self {
        Self::with_parser(http_client, config, Arc::new(HtmlPostParser))
    }

    pub fn with_parser(
        http_client: Arc<dyn HttpClient>,
        config: ExtractionConfig,
        parser: Arc<dyn PostParser>,
    ) -> Self {
        Self {
            http_client,
            parser,
            config,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for EmbedStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure> {
        let request = HttpRequest::get(reference.embed_url())
            .user_agent(&self.config.desktop_user_agent);
        let response = fetch(self.http_client.as_ref(), NAME, request).await?;
        let html = body_text(NAME, &response)?;

        if let Some(post) = self.parser.parse_embedded_post(&html, reference) {
            return Ok(post);
        }

        let media = scan_media_urls(&html, &self.config.cdn_hosts);
        if media.is_empty() {
            return Err(StrategyFailure::new(NAME, "no inline data or media URLs"));
        }

        debug!(shortcode = %reference.shortcode, count = media.len(), "Using raw media scan");
        let mut post = ExtractedPost::new(reference, NAME);
        post.is_carousel = media.len() > 1;
        post.media = media;
        Ok(post)
    }
}
