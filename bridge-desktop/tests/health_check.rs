//! Health checks over real HTTP against a local mock server.

use bridge_desktop::ReqwestHttpClient;
use core_backup::{HealthCheck, HealthChecker, ProbeOutcome};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([0, 128, 255]),
    ));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn checker(timeout: Duration) -> HealthChecker {
    HealthChecker::new(Arc::new(ReqwestHttpClient::new().unwrap()), timeout)
}

#[tokio::test]
async fn test_head_ok_is_alive() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(2, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let alive = checker(Duration::from_secs(10))
        .is_alive(&format!("{}/a.png", server.uri()))
        .await;
    assert!(alive);
}

#[tokio::test]
async fn test_missing_resource_is_dead() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(2, 2)))
        .expect(0)
        .mount(&server)
        .await;

    let alive = checker(Duration::from_secs(10))
        .is_alive(&format!("{}/gone.png", server.uri()))
        .await;
    assert!(!alive);
}

#[tokio::test]
async fn test_blocked_head_decodes_full_body() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(16, 9)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let checker = checker(Duration::from_secs(10));
    assert_eq!(
        checker.probe(&format!("{}/ok.png", server.uri())).await,
        ProbeOutcome::Alive
    );
    assert_eq!(
        checker.probe(&format!("{}/empty.png", server.uri())).await,
        ProbeOutcome::Dead
    );
}

#[tokio::test]
async fn test_slow_host_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let outcome = checker(Duration::from_secs(1))
        .probe(&format!("{}/slow.png", server.uri()))
        .await;
    assert!(!outcome.is_alive());
}
