//! Health, docs and routing integration tests.

mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_status!(response, 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn health_status_reports_service() {
    let app = TestApp::spawn().await;

    let response = app.get("/health/status").await;

    assert_status!(response, 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "hospice-rbac-test");
}

#[tokio::test]
async fn readiness_checks_database_and_schema() {
    let app = TestApp::spawn().await;

    let response = app.get("/health/ready").await;

    assert_status!(response, 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["schema"]["status"], "up");
}

#[tokio::test]
async fn liveness_returns_ok() {
    let app = TestApp::spawn().await;

    assert_status!(app.get("/health/live").await, 200);
}

#[tokio::test]
async fn metrics_unavailable_when_disabled() {
    let app = TestApp::spawn().await;

    assert_status!(app.get("/metrics").await, 503);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.base_url))
        .header("x-request-id", "idg-review-7")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "idg-review-7"
    );

    let generated = app.get("/health").await;
    assert!(generated.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let response = app.get("/api-docs/openapi.json").await;

    assert_status!(response, 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["info"]["title"], "Hospice RBAC API");
    assert!(body["paths"]["/role/store"].is_object());
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/nonexistent-endpoint").await;

    assert_status!(response, 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}
