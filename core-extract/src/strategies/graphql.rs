//! Structured query strategy
//!
//! Posts a data query to the internal GraphQL endpoint once per known query
//! template. Template identifiers expire silently, so every one is tried
//! before giving up; the first one answering with a post node wins.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::ExtractionConfig;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{fetch, ExtractionStrategy};
use crate::error::StrategyFailure;
use crate::model::ExtractedPost;
use crate::parse::normalize_graph_node;
use crate::reference::PostReference;

const NAME: &str = "graphql";

const GRAPHQL_ENDPOINT: &str = "https://www.instagram.com/graphql/query";

#[derive(Debug, Serialize)]
struct QueryForm<'a> {
    doc_id: &'a str,
    variables: String,
}

pub struct GraphqlStrategy {
    http_client: Arc<dyn HttpClient>,
    config: ExtractionConfig,
    endpoint: String,
}

impl GraphqlStrategy {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ExtractionConfig) -> Self {
        Self {
            http_client,
            config,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_request(&self, template: &str, reference: &PostReference) -> Result<HttpRequest, String> {
        let variables = serde_json::json!({ "shortcode": reference.shortcode }).to_string();
        HttpRequest::post(&self.endpoint)
            .user_agent(&self.config.desktop_user_agent)
            .header("X-IG-App-ID", &self.config.web_app_id)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&QueryForm {
                doc_id: template,
                variables,
            })
            .map_err(|e| e.to_string())
    }

    async fn try_template(
        &self,
        template: &str,
        reference: &PostReference,
    ) -> Result<ExtractedPost, String> {
        let request = self.build_request(template, reference)?;
        let response = fetch(self.http_client.as_ref(), NAME, request)
            .await
            .map_err(|failure| failure.reason)?;

        let body: Value = response
            .json()
            .map_err(|_| "response is not structured data".to_string())?;

        let node = ["/data/xdt_shortcode_media", "/data/shortcode_media"]
            .iter()
            .find_map(|path| body.pointer(path).filter(|n| n.is_object()))
            .ok_or_else(|| "no post node".to_string())?;

        let post = normalize_graph_node(node, reference);
        if !post.has_media() {
            return Err("post node has no media".to_string());
        }
        Ok(post)
    }
}

#[async_trait]
impl ExtractionStrategy for GraphqlStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure> {
        if self.config.query_templates.is_empty() {
            return Err(StrategyFailure::new(NAME, "no query templates configured"));
        }

        let mut reasons = Vec::new();

        for template in &self.config.query_templates {
            match self.try_template(template, reference).await {
                Ok(mut post) => {
                    post.template = Some(template.clone());
                    return Ok(post);
                }
                Err(reason) => {
                    debug!(template = %template, reason = %reason, "Query template rejected");
                    reasons.push(format!("{} {}", template, reason));
                }
            }
        }

        Err(StrategyFailure::new(NAME, reasons.join(", ")))
    }
}
