//! Locator health checks
//!
//! A metadata-only `HEAD` first. Hosts that refuse it (403/405/501, or a
//! transport error) get a full `GET` whose body has to decode to an image
//! with non-zero dimensions. The whole probe runs under one timeout and every
//! outcome collapses to a boolean.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_async::time::{timeout, Duration};
use core_runtime::config::BackupConfig;
use core_runtime::logging::strip_query;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Liveness check for a stored locator.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn is_alive(&self, url: &str) -> bool;
}

/// Result of one probe before collapsing to a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Alive,
    Dead,
    /// Timed out, or the host answered with something we cannot judge.
    Inconclusive,
}

impl ProbeOutcome {
    /// Inconclusive counts as dead: a re-upload beats a silently broken reuse.
    pub fn is_alive(self) -> bool {
        self == ProbeOutcome::Alive
    }
}

pub struct HealthChecker {
    http_client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(http_client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &BackupConfig) -> Self {
        Self::new(http_client, config.health_timeout)
    }

    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let url = url.trim();
        if url.is_empty() {
            return ProbeOutcome::Dead;
        }

        let outcome = match timeout(self.timeout, self.probe_head(url)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Inconclusive,
        };

        debug!(url = %strip_query(url), ?outcome, "Health probe finished");
        outcome
    }

    async fn probe_head(&self, url: &str) -> ProbeOutcome {
        let request = HttpRequest::head(url).timeout(self.timeout);

        match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => {
                if response.content_length() == Some(0) {
                    ProbeOutcome::Dead
                } else {
                    ProbeOutcome::Alive
                }
            }
            Ok(response) if matches!(response.status, 403 | 405 | 501) => {
                self.probe_fetch(url).await
            }
            Ok(response) if response.is_client_error() => ProbeOutcome::Dead,
            Ok(_) => ProbeOutcome::Inconclusive,
            Err(e) => {
                debug!(error = %e, "HEAD refused, falling back to full fetch");
                self.probe_fetch(url).await
            }
        }
    }

    async fn probe_fetch(&self, url: &str) -> ProbeOutcome {
        let request = HttpRequest::get(url).timeout(self.timeout);

        match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => match image_dimensions(&response.body) {
                Some((width, height)) if width > 0 && height > 0 => ProbeOutcome::Alive,
                _ => ProbeOutcome::Dead,
            },
            Ok(_) => ProbeOutcome::Dead,
            Err(_) => ProbeOutcome::Inconclusive,
        }
    }
}

#[async_trait]
impl HealthCheck for HealthChecker {
    async fn is_alive(&self, url: &str) -> bool {
        self.probe(url).await.is_alive()
    }
}

/// Header-only decode; `None` for empty or unrecognized bodies.
fn image_dimensions(body: &[u8]) -> Option<(u32, u32)> {
    if body.is_empty() {
        return None;
    }
    image::ImageReader::new(Cursor::new(body))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpMethod, HttpResponse};
    use image::{DynamicImage, ImageFormat};
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([255, 0, 0]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn is_method(method: HttpMethod) -> impl Fn(&HttpRequest) -> bool {
        move |r: &HttpRequest| r.method == method
    }

    fn checker(mock: MockHttpClient) -> HealthChecker {
        HealthChecker::new(Arc::new(mock), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_head_success_is_alive() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Head)))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "").with_header("Content-Length", "5120")));

        assert!(checker(mock).is_alive("https://res.example.com/a.jpg").await);
    }

    #[tokio::test]
    async fn test_zero_length_is_dead() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(HttpResponse::new(200, "").with_header("content-length", "0")));

        assert_eq!(checker(mock).probe("https://res.example.com/a.jpg").await, ProbeOutcome::Dead);
    }

    #[tokio::test]
    async fn test_not_found_is_dead_without_fallback() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Head)))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));

        assert!(!checker(mock).is_alive("https://res.example.com/gone.jpg").await);
    }

    #[tokio::test]
    async fn test_refused_head_falls_back_to_decode() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Head)))
            .returning(|_| Ok(HttpResponse::new(405, "")));
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Get)))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, png(4, 3))));

        assert!(checker(mock).is_alive("https://i.ibb.co/a.png").await);
    }

    #[tokio::test]
    async fn test_transport_error_then_garbage_body_is_dead() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Head)))
            .returning(|_| Err(BridgeError::OperationFailed("blocked".to_string())));
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Get)))
            .returning(|_| Ok(HttpResponse::new(200, "<html>not an image</html>")));

        assert_eq!(checker(mock).probe("https://i.ibb.co/a.png").await, ProbeOutcome::Dead);
    }

    #[tokio::test]
    async fn test_fallback_empty_body_is_dead() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Head)))
            .returning(|_| Ok(HttpResponse::new(403, "")));
        mock.expect_execute()
            .with(function(is_method(HttpMethod::Get)))
            .returning(|_| Ok(HttpResponse::new(200, "")));

        assert!(!checker(mock).is_alive("https://i.ibb.co/a.png").await);
    }

    #[tokio::test]
    async fn test_server_error_is_inconclusive() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(HttpResponse::new(503, "")));

        let outcome = checker(mock).probe("https://res.example.com/a.jpg").await;
        assert_eq!(outcome, ProbeOutcome::Inconclusive);
        assert!(!outcome.is_alive());
    }

    struct HangingClient;

    #[async_trait]
    impl HttpClient for HangingClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            core_async::time::sleep(Duration::from_secs(3600)).await;
            Ok(HttpResponse::new(200, "late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_inconclusive() {
        let checker = HealthChecker::new(Arc::new(HangingClient), Duration::from_secs(10));
        assert_eq!(
            checker.probe("https://res.example.com/slow.jpg").await,
            ProbeOutcome::Inconclusive
        );
    }

    #[tokio::test]
    async fn test_blank_url_skips_request() {
        let mock = MockHttpClient::new();
        assert!(!checker(mock).is_alive("  ").await);
    }

    #[test]
    fn test_image_dimensions() {
        assert_eq!(image_dimensions(&png(7, 2)), Some((7, 2)));
        assert_eq!(image_dimensions(b""), None);
        assert_eq!(image_dimensions(b"GIF89"), None);
    }
}
