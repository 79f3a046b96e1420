//! Health endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, build_test_app_without_vendor, VIDEO_URL};
use inflio_api::router::MAX_BODY_BYTES;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app();
    let response = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["clips_enabled"], true);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn health_reports_clips_disabled_without_vendor() {
    let app = build_test_app_without_vendor();
    let json = body_json(app.send(Method::GET, "/health", None, None).await).await;
    assert_eq!(json["clips_enabled"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app();
    let response = app.send(Method::GET, "/this-route-does-not-exist", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_carries_request_id() {
    let app = build_test_app();
    let response = app.send(Method::GET, "/health", None, None).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_response_exposes_request_id() {
    let app = build_test_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get("access-control-expose-headers").unwrap(),
        "x-request-id"
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = build_test_app();
    let description = "x".repeat(MAX_BODY_BYTES);
    let response = app
        .post_json(
            "/api/v1/projects",
            "user_1",
            serde_json::json!({
                "title": "Too big",
                "video_url": VIDEO_URL,
                "description": description,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
