//! Feedback bonus integration tests for quota-service.

mod common;

use common::{random_user_id, TestApp, TEST_BONUS_AMOUNT, TEST_FREE_LIMIT};
use quota_service::models::Period;
use serde_json::json;

async fn exhaust_free_limit(app: &TestApp, user_id: i64) {
    for _ in 0..TEST_FREE_LIMIT {
        let response = app
            .post("/v1/quota/usage", &json!({ "user_id": user_id }))
            .await;
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn feedback_under_the_limit_is_not_eligible() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();

    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "great bot" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "not_eligible");
    assert_eq!(body["count"], 0);

    // Nothing was written to either ledger.
    let period = Period::current();
    assert!(!app.db.has_feedback(user_id, &period).await.unwrap());
    assert_eq!(app.db.get_count(user_id, &period).await.unwrap(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn feedback_at_the_limit_grants_the_bonus_once() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();

    // Scenario: count = 3, freeLimit = 3, bonusAmount = 3.
    exhaust_free_limit(&app, user_id).await;

    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "please raise the limit" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "granted");
    assert_eq!(body["count"], TEST_FREE_LIMIT - TEST_BONUS_AMOUNT);

    let period = Period::current();
    assert!(app.db.has_feedback(user_id, &period).await.unwrap());
    assert_eq!(app.db.get_count(user_id, &period).await.unwrap(), 0);

    // Second submission in the same period: already granted, count
    // untouched — even though the user is back under the limit.
    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "me again" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "already_granted");
    assert_eq!(body["count"], 0);
    assert_eq!(app.db.get_count(user_id, &period).await.unwrap(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn bonus_decrement_is_floored_at_zero() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();
    let period = Period::current();

    // Count 3, bonus 5: the counter clamps to 0 instead of going negative.
    for _ in 0..TEST_FREE_LIMIT {
        app.db.increment_count(user_id, &period).await.unwrap();
    }
    let grant = app
        .db
        .grant_bonus(user_id, &period, "clamp me", TEST_BONUS_AMOUNT + 2)
        .await
        .unwrap();
    assert_eq!(
        grant,
        quota_service::models::BonusGrant::Granted { count: 0 }
    );

    app.cleanup().await;
}

#[tokio::test]
async fn bonus_creates_the_usage_row_when_none_exists() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();
    let period = Period::current();

    // Grant directly at the ledger level for a user with no usage row.
    let grant = app
        .db
        .grant_bonus(user_id, &period, "no usage yet", TEST_BONUS_AMOUNT)
        .await
        .unwrap();
    assert_eq!(
        grant,
        quota_service::models::BonusGrant::Granted { count: 0 }
    );
    assert_eq!(app.db.get_count(user_id, &period).await.unwrap(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn blank_feedback_content_is_rejected() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();
    exhaust_free_limit(&app, user_id).await;

    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "   " }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // The rejection happened before any store access.
    assert!(!app
        .db
        .has_feedback(user_id, &Period::current())
        .await
        .unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn bonus_restores_headroom_until_consumed_again() {
    let app = TestApp::spawn().await;
    let user_id = random_user_id();

    exhaust_free_limit(&app, user_id).await;
    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "round two" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "granted");

    // The restored headroom can be spent...
    let response = app
        .post("/v1/quota/authorize", &json!({ "user_id": user_id }))
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decision"], "allowed");

    // ...and once consumed the user is exhausted again, with no second
    // bonus available this period.
    exhaust_free_limit(&app, user_id).await;
    let response = app
        .post("/v1/quota/authorize", &json!({ "user_id": user_id }))
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decision"], "limit_exceeded");

    let response = app
        .post(
            "/v1/quota/feedback",
            &json!({ "user_id": user_id, "content": "round three" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "already_granted");

    app.cleanup().await;
}
