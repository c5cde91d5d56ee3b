//! Health and metrics endpoint tests for quota-service.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "quota-service");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn().await;

    // Generate a little traffic so the counters exist.
    app.post(
        "/v1/quota/authorize",
        &serde_json::json!({ "user_id": common::random_user_id() }),
    )
    .await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("quota_decisions_total"));

    app.cleanup().await;
}
