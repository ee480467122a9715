use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use serial_test::serial;

use super::{send, TestApi};
use crate::api;
use crate::config::AppConfig;
use crate::tests::global::mock_global_state;

#[serial]
#[tokio::test]
async fn test_serial_health() {
    let api = TestApi::start().await;

    let resp = api.client.get(api.url("/health")).send().await.expect("failed to get health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|s| s.to_str().ok()),
        Some("*")
    );
    let body: serde_json::Value = resp.json().await.expect("failed to read body");
    assert_eq!(body, json!({"status": "ok"}));

    api.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_preflight_and_not_found() {
    let api = TestApi::start().await;

    let resp = api
        .client
        .request(reqwest::Method::OPTIONS, api.url("/passes/register"))
        .header(header::ORIGIN, "http://localhost:3000")
        .send()
        .await
        .expect("failed to send preflight");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));

    let (status, body) = send(api.client.get(api.url("/nothing/here"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "not found"}));

    api.shutdown().await;
}

#[tokio::test]
async fn test_routes_build() {
    let (global, handler) = mock_global_state(AppConfig::default());

    let router = api::routes(&global);
    assert!(router.is_ok(), "failed to build router: {:?}", router.err());

    drop(global);
    tokio::time::timeout(std::time::Duration::from_secs(1), handler.cancel())
        .await
        .expect("failed to cancel context");
}
