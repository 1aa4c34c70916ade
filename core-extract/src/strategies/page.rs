//! Public page strategy, the last resort
//!
//! Inline structured data first, then the social preview tags. The preview
//! path only ever yields a single media item.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExtractionConfig;
use std::sync::Arc;

use super::{body_text, fetch, ExtractionStrategy};
use crate::error::StrategyFailure;
use crate::model::ExtractedPost;
use crate::parse::{HtmlPostParser, PostParser, PreviewTags};
use crate::reference::PostReference;

const NAME: &str = "page";

pub struct PageStrategy {
    http_client: Arc<dyn HttpClient>,
    parser: Arc<dyn PostParser>,
    config: ExtractionConfig,
}

impl PageStrategy {
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
impl ExtractionStrategy for PageStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure> {
        let request = HttpRequest::get(reference.canonical_url())
            .user_agent(&self.config.desktop_user_agent)
            .header("Accept-Language", "en-US,en;q=0.9");
        let response = fetch(self.http_client.as_ref(), NAME, request).await?;
        let html = body_text(NAME, &response)?;

        if let Some(post) = self.parser.parse_embedded_post(&html, reference) {
            return Ok(post);
        }

        PreviewTags::parse(&html)
            .to_post(reference)
            .ok_or_else(|| StrategyFailure::new(NAME, "no inline data or preview image"))
    }
}
