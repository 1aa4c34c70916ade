//! Extraction pipeline
//!
//! Ordered strategy list with first-success short-circuit. Strategy failures
//! are collected as diagnostics; the caller only sees an error once every
//! strategy has failed.

use bridge_traits::http::HttpClient;
use core_runtime::config::ExtractionConfig;
use core_runtime::events::{CoreEvent, EventBus, ExtractionEvent};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{ExtractError, Result, StrategyFailure};
use crate::model::ExtractedPost;
use crate::parse::{HtmlPostParser, PostParser};
use crate::reference::PostReference;
use crate::strategies::{
    EmbedStrategy, ExtractionStrategy, GraphqlStrategy, MobileApiStrategy, PageStrategy,
};

pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    event_bus: Option<EventBus>,
}

impl ExtractionPipeline {
    /// The four built-in strategies in priority order.
    pub fn new(http_client: Arc<dyn HttpClient>, config: &ExtractionConfig) -> Self {
        Self::with_parser(http_client, config, Arc::new(HtmlPostParser))
    }

    /// Built-in strategies with a custom HTML parser.
    pub fn with_parser(
        http_client: Arc<dyn HttpClient>,
        config: &ExtractionConfig,
        parser: Arc<dyn PostParser>,
    ) -> Self {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(GraphqlStrategy::new(http_client.clone(), config.clone())),
            Box::new(MobileApiStrategy::new(http_client.clone(), config.clone())),
            Box::new(EmbedStrategy::with_parser(
                http_client.clone(),
                config.clone(),
                parser.clone(),
            )),
            Box::new(PageStrategy::with_parser(http_client, config.clone(), parser)),
        ];
        Self::with_strategies(strategies)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse `url` and extract it.
    pub async fn extract_url(&self, url: &str) -> Result<(PostReference, ExtractedPost)> {
        let reference = PostReference::parse(url)?;
        let post = self.extract(&reference).await?;
        Ok((reference, post))
    }

    /// Try every strategy in order until one yields media.
    #[instrument(skip(self), fields(shortcode = %reference.shortcode))]
    pub async fn extract(&self, reference: &PostReference) -> Result<ExtractedPost> {
        let mut diagnostics = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            info!(strategy = name, "Attempting extraction");

            let failure = match strategy.attempt(reference).await {
                Ok(post) if post.has_media() => {
                    let post = Self::stamp(post, reference, name);
                    info!(
                        strategy = name,
                        template = ?post.template,
                        media = post.media.len(),
                        carousel = post.is_carousel,
                        "Extraction succeeded"
                    );
                    self.emit(ExtractionEvent::Succeeded {
                        shortcode: reference.shortcode.clone(),
                        strategy: name.to_string(),
                        template: post.template.clone(),
                    });
                    return Ok(post);
                }
                Ok(_) => StrategyFailure::new(name, "no media"),
                Err(failure) => failure,
            };

            warn!(strategy = name, reason = %failure.reason, "Strategy failed");
            diagnostics.push(failure.to_string());
        }

        if diagnostics.is_empty() {
            diagnostics.push("no extraction strategies configured".to_string());
        }

        warn!(attempts = self.strategies.len(), "All extraction strategies failed");
        self.emit(ExtractionEvent::Exhausted {
            shortcode: reference.shortcode.clone(),
            attempts: self.strategies.len() as u32,
        });

        Err(ExtractError::Exhausted {
            shortcode: reference.shortcode.clone(),
            diagnostics,
        })
    }

    /// Reference-derived fields win over whatever the strategy filled in.
    fn stamp(mut post: ExtractedPost, reference: &PostReference, strategy: &str) -> ExtractedPost {
        post.shortcode = reference.shortcode.clone();
        post.kind = reference.kind;
        post.strategy = strategy.to_string();
        post
    }

    fn emit(&self, event: ExtractionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Extraction(event)).ok();
        }
    }
}
