//! Pipeline ordering and fallback behaviour, with scripted strategies and a
//! routed fake HTTP client serving literal fixtures.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_extract::{
    ExtractError, ExtractedMedia, ExtractedPost, ExtractionOutput, ExtractionPipeline,
    ExtractionStrategy, PostReference, StrategyFailure,
};
use core_library::models::PostKind;
use core_runtime::config::ExtractionConfig;
use core_runtime::events::{CoreEvent, EventBus, ExtractionEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Scripted strategies
// ============================================================================

enum Script {
    Fail(&'static str),
    Empty,
    Media(usize),
}

struct ScriptedStrategy {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    fn boxed(name: &'static str, script: Script, calls: &Arc<AtomicUsize>) -> Box<dyn ExtractionStrategy> {
        Box::new(Self {
            name,
            script,
            calls: calls.clone(),
        })
    }
}

#[async_trait]
impl ExtractionStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, reference: &PostReference) -> Result<ExtractedPost, StrategyFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Fail(reason) => Err(StrategyFailure::new(self.name, reason)),
            Script::Empty => Ok(ExtractedPost::new(reference, self.name)),
            Script::Media(count) => {
                let mut post = ExtractedPost::new(reference, "whatever");
                post.kind = PostKind::LongVideo;
                post.media = (0..count)
                    .map(|i| ExtractedMedia::image(format!("https://x.fbcdn.net/{}.jpg", i)))
                    .collect();
                Ok(post)
            }
        }
    }
}

fn reference() -> PostReference {
    PostReference::parse("https://www.instagram.com/p/ABC123/").unwrap()
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let later = Arc::new(AtomicUsize::new(0));
    let pipeline = ExtractionPipeline::with_strategies(vec![
        ScriptedStrategy::boxed("one", Script::Fail("HTTP 401"), &calls),
        ScriptedStrategy::boxed("two", Script::Media(2), &calls),
        ScriptedStrategy::boxed("three", Script::Media(1), &later),
    ]);

    let post = pipeline.extract(&reference()).await.unwrap();

    assert_eq!(post.strategy, "two");
    assert_eq!(post.media.len(), 2);
    assert_eq!(post.kind, PostKind::Standard, "kind comes from the URL");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_media_falls_through() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = ExtractionPipeline::with_strategies(vec![
        ScriptedStrategy::boxed("empty", Script::Empty, &calls),
        ScriptedStrategy::boxed("full", Script::Media(1), &calls),
    ]);

    let post = pipeline.extract(&reference()).await.unwrap();
    assert_eq!(post.strategy, "full");
}

#[tokio::test]
async fn test_exhaustion_joins_every_diagnostic() {
    let calls = Arc::new(AtomicUsize::new(0));
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let pipeline = ExtractionPipeline::with_strategies(vec![
        ScriptedStrategy::boxed("graphql", Script::Fail("HTTP 401"), &calls),
        ScriptedStrategy::boxed("embed", Script::Empty, &calls),
        ScriptedStrategy::boxed("page", Script::Fail("no preview"), &calls),
    ])
    .with_event_bus(bus);

    let error = pipeline.extract(&reference()).await.unwrap_err();

    match &error {
        ExtractError::Exhausted { shortcode, diagnostics } => {
            assert_eq!(shortcode, "ABC123");
            assert_eq!(
                diagnostics,
                &vec![
                    "graphql: HTTP 401".to_string(),
                    "embed: no media".to_string(),
                    "page: no preview".to_string()
                ]
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let output = ExtractionOutput::failure(Some(&reference()), &error);
    assert!(!output.success);
    assert!(output.media.is_empty());
    assert!(!output.note.unwrap().is_empty());

    match events.try_recv().unwrap() {
        CoreEvent::Extraction(ExtractionEvent::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_strategies_still_reports_a_diagnostic() {
    let error = ExtractionPipeline::with_strategies(Vec::new())
        .extract(&reference())
        .await
        .unwrap_err();
    assert!(!error.note().is_empty());
}

#[tokio::test]
async fn test_unrecognized_url() {
    let pipeline = ExtractionPipeline::with_strategies(Vec::new());
    assert!(matches!(
        pipeline.extract_url("https://www.instagram.com/explore/").await,
        Err(ExtractError::InvalidReference(_))
    ));
}

// ============================================================================
// Built-in strategies over fixtures
// ============================================================================

/// Serves fixed responses by URL and records every requested URL.
struct RoutedHttpClient {
    routes: Vec<(&'static str, u16, &'static str)>,
    requested: Mutex<Vec<String>>,
}

impl RoutedHttpClient {
    fn new(routes: Vec<(&'static str, u16, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for RoutedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requested.lock().unwrap().push(request.url.clone());
        self.routes
            .iter()
            .find(|(prefix, _, _)| request.url.starts_with(prefix))
            .map(|(_, status, body)| HttpResponse::new(*status, *body))
            .ok_or_else(|| BridgeError::OperationFailed(format!("no route for {}", request.url)))
    }
}

const PAGE_FIXTURE: &str = r#"<!DOCTYPE html>
<html><head>
<meta property="og:title" content="user on Instagram" />
<meta property="og:image" content="https://scontent-hkg4-1.cdninstagram.com/v/t51.29350-15/abc.jpg?stp=dst-jpg&amp;_nc_ht=x" />
<meta property="og:description" content="2019-07-14 — user on Instagram" />
</head><body></body></html>"#;

const EMBED_FIXTURE: &str = r#"<html><body><div class="Embed">
<script>window.__additionalDataLoaded('extra',{"shortcode_media":{"__typename":"GraphSidecar","shortcode":"ABC123",
"display_url":"https://scontent.cdninstagram.com/cover.jpg","taken_at_timestamp":1563098400,
"edge_media_to_caption":{"edges":[{"node":{"text":"190714 trip"}}]},
"owner":{"username":"user"},
"edge_sidecar_to_children":{"edges":[
 {"node":{"display_url":"https://scontent.cdninstagram.com/1.jpg","is_video":false}},
 {"node":{"display_url":"https://scontent.cdninstagram.com/2.jpg","is_video":true,"video_url":"https://scontent.cdninstagram.com/2.mp4"}}]}}});</script>
</div></body></html>"#;

#[tokio::test]
async fn test_only_public_page_succeeds() {
    let http = RoutedHttpClient::new(vec![
        ("https://www.instagram.com/graphql/query", 401, r#"{"message":"login"}"#),
        ("https://i.instagram.com/api/v1/media/", 400, r#"{"status":"fail"}"#),
        ("https://www.instagram.com/p/ABC123/embed/", 200, "<html>Not available</html>"),
        ("https://www.instagram.com/p/ABC123/", 200, PAGE_FIXTURE),
    ]);
    let pipeline = ExtractionPipeline::new(http.clone(), &ExtractionConfig::default());
    assert_eq!(pipeline.strategy_names(), vec!["graphql", "mobile_api", "embed", "page"]);

    let post = pipeline.extract(&reference()).await.unwrap();

    assert_eq!(post.strategy, "page");
    assert_eq!(post.media.len(), 1);
    assert_eq!(post.owner_username.as_deref(), Some("user"));
    assert!(post.caption.contains("2019-07-14 — user on Instagram"));
    assert!(post.media[0].url.ends_with("abc.jpg?stp=dst-jpg&_nc_ht=x"));

    // two templates, mobile, embed, page
    assert_eq!(http.requested().len(), 5);

    let output = ExtractionOutput::from_post(&post, None);
    assert!(output.success);
    assert_eq!(output.owner.username.as_deref(), Some("user"));
}

#[tokio::test]
async fn test_embed_blob_beats_page() {
    let http = RoutedHttpClient::new(vec![
        ("https://www.instagram.com/graphql/query", 200, r#"{"data":{"xdt_shortcode_media":null}}"#),
        ("https://i.instagram.com/api/v1/media/", 404, ""),
        ("https://www.instagram.com/p/ABC123/embed/", 200, EMBED_FIXTURE),
    ]);
    let bus = EventBus::new(8);
    let mut events = bus.subscribe();
    let pipeline =
        ExtractionPipeline::new(http.clone(), &ExtractionConfig::default()).with_event_bus(bus);

    let post = pipeline.extract(&reference()).await.unwrap();

    assert_eq!(post.strategy, "embed");
    assert!(post.is_carousel);
    assert_eq!(post.media.len(), 2);
    assert!(post.media[1].is_video());
    assert_eq!(post.caption, "190714 trip");
    assert!(!http
        .requested()
        .iter()
        .any(|url| url == "https://www.instagram.com/p/ABC123/"));

    match events.try_recv().unwrap() {
        CoreEvent::Extraction(ExtractionEvent::Succeeded { strategy, template, .. }) => {
            assert_eq!(strategy, "embed");
            assert!(template.is_none());
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
