//! Administrative reset integration tests for quota-service.

mod common;

use common::{random_user_id, TestApp, TEST_BONUS_AMOUNT, TEST_FREE_LIMIT};
use quota_service::models::Period;
use serde_json::json;

#[tokio::test]
async fn reset_limits_zeroes_counters_and_keeps_feedback() {
    let app = TestApp::spawn().await;
    let period = Period::current();
    let user_a = random_user_id();
    let user_b = random_user_id();

    for _ in 0..TEST_FREE_LIMIT {
        app.db.increment_count(user_a, &period).await.unwrap();
    }
    app.db.increment_count(user_b, &period).await.unwrap();
    app.db
        .grant_bonus(user_a, &period, "keep this", TEST_BONUS_AMOUNT)
        .await
        .unwrap();

    let response = app.post("/v1/admin/reset-limits", &json!({})).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["period"], period.to_string());
    assert_eq!(body["counters_reset"], 2);

    // Counters zeroed, rows kept, feedback untouched.
    assert_eq!(app.db.get_count(user_a, &period).await.unwrap(), 0);
    assert_eq!(app.db.get_count(user_b, &period).await.unwrap(), 0);
    assert!(app.db.has_feedback(user_a, &period).await.unwrap());

    let stats = app
        .db
        .period_stats(&period, TEST_FREE_LIMIT)
        .await
        .unwrap();
    assert_eq!(stats.users_total, 2);
    assert_eq!(stats.users_at_limit, 0);
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.feedback_count, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn admin_can_read_collected_feedback() {
    let app = TestApp::spawn().await;
    let period = Period::current();
    let user_id = random_user_id();

    for _ in 0..TEST_FREE_LIMIT {
        app.db.increment_count(user_id, &period).await.unwrap();
    }
    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "needs dark mode" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/v1/admin/feedback").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["period"], period.to_string());
    let feedback = body["feedback"].as_array().unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0]["user_id"], user_id);
    assert_eq!(feedback[0]["content"], "needs dark mode");

    app.cleanup().await;
}

#[tokio::test]
async fn reset_limits_leaves_other_periods_alone() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();

    let other = Period::from_utc(chrono::Utc::now() + chrono::Duration::days(40));
    app.db.increment_count(user_id, &other).await.unwrap();

    let response = app.post("/v1/admin/reset-limits", &json!({})).await;
    assert_eq!(response.status(), 200);

    assert_eq!(app.db.get_count(user_id, &other).await.unwrap(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn full_reset_requires_the_issued_confirmation_token() {
    let app = TestApp::spawn().await;
    let period = Period::current();
    let user_id = random_user_id();

    for _ in 0..TEST_FREE_LIMIT {
        app.db.increment_count(user_id, &period).await.unwrap();
    }
    app.db
        .grant_bonus(user_id, &period, "wipe me", TEST_BONUS_AMOUNT)
        .await
        .unwrap();

    // No token issued yet: refused.
    let response = app
        .post(
            "/v1/admin/reset-all",
            &json!({ "confirmation_token": "anything" }),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Wrong token: refused, data intact.
    let response = app.post("/v1/admin/reset-all/confirmation", &json!({})).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["confirmation_token"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/v1/admin/reset-all",
            &json!({ "confirmation_token": "not-the-token" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    assert!(app.db.has_feedback(user_id, &period).await.unwrap());

    // Exact token: everything goes.
    let response = app
        .post("/v1/admin/reset-all", &json!({ "confirmation_token": token }))
        .await;
    assert_eq!(response.status(), 204);

    assert_eq!(app.db.get_count(user_id, &period).await.unwrap(), 0);
    assert!(!app.db.has_feedback(user_id, &period).await.unwrap());

    let stats = app
        .db
        .period_stats(&period, TEST_FREE_LIMIT)
        .await
        .unwrap();
    assert_eq!(stats.users_total, 0);
    assert_eq!(stats.feedback_count, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn full_reset_token_is_single_use() {
    let app = TestApp::spawn().await;

    let response = app.post("/v1/admin/reset-all/confirmation", &json!({})).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["confirmation_token"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/v1/admin/reset-all",
            &json!({ "confirmation_token": token.clone() }),
        )
        .await;
    assert_eq!(response.status(), 204);

    // Replaying the consumed token is refused.
    let response = app
        .post("/v1/admin/reset-all", &json!({ "confirmation_token": token }))
        .await;
    assert_eq!(response.status(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn full_reset_wipes_every_period() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();

    let current = Period::current();
    let other = Period::from_utc(chrono::Utc::now() + chrono::Duration::days(40));
    app.db.increment_count(user_id, &current).await.unwrap();
    app.db.increment_count(user_id, &other).await.unwrap();

    let response = app.post("/v1/admin/reset-all/confirmation", &json!({})).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["confirmation_token"].as_str().unwrap().to_string();

    let response = app
        .post("/v1/admin/reset-all", &json!({ "confirmation_token": token }))
        .await;
    assert_eq!(response.status(), 204);

    assert_eq!(app.db.get_count(user_id, &current).await.unwrap(), 0);
    assert_eq!(app.db.get_count(user_id, &other).await.unwrap(), 0);

    app.cleanup().await;
}
