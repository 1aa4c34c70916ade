//! Extraction strategies
//!
//! Each strategy is one independently fallible way of turning a reference into
//! post data. The pipeline tries them in priority order:
//!
//! 1. [`GraphqlStrategy`] - structured query against the internal API
//! 2. [`MobileApiStrategy`] - mobile-optimized JSON endpoint
//! 3. [`EmbedStrategy`] - embeddable HTML rendering
//! 4. [`PageStrategy`] - canonical public page

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};

use crate::error::StrategyFailure;
use crate::model::ExtractedPost;
use crate::reference::PostReference;

pub mod embed;
pub mod graphql;
pub mod mobile;
pub mod page;

pub use embed::EmbedStrategy;
pub use graphql::GraphqlStrategy;
pub use mobile::MobileApiStrategy;
pub use page::PageStrategy;

/// One method of extracting post data from the source.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Stable identifier, reported on success and prefixed to diagnostics
    fn name(&self) -> &'static str;

    /// Attempt extraction. A returned post must carry at least one media item.
    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure>;
}

/// Execute `request` and require a 2xx status.
pub(crate) async fn fetch(
    http: &dyn HttpClient,
    strategy: &'static str,
    request: HttpRequest,
) -> Result<HttpResponse, StrategyFailure> {
    let response = http
        .execute(request)
        .await
        .map_err(|e| StrategyFailure::new(strategy, e.to_string()))?;

    if !response.is_success() {
        return Err(StrategyFailure::new(
            strategy,
            format!("HTTP {}", response.status),
        ));
    }

    Ok(response)
}

/// Response body as text, for the HTML strategies.
pub(crate) fn body_text(
    strategy: &'static str,
    response: &HttpResponse,
) -> Result<String, StrategyFailure> {
    response
        .text()
        .map_err(|e| StrategyFailure::new(strategy, e.to_string()))
}
