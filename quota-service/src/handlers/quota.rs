//! Quota endpoints: the boundary the request handler calls into.

use crate::dtos::{
    AuthorizeRequest, AuthorizeResponse, FeedbackRequest, FeedbackResponse, RecordUsageRequest,
    RecordUsageResponse,
};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

/// Pre-flight check before the caller performs the chargeable action.
/// Mutates nothing: a failed or cancelled downstream action must not cost
/// quota, so recording happens in a separate call afterwards.
pub async fn authorize(
    State(state): State<AppState>,
    Json(req): Json<AuthorizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth = state
        .quota
        .authorize(req.user_id, state.config.quota.free_limit)
        .await?;

    Ok(Json(AuthorizeResponse {
        decision: auth.decision,
        count: auth.count,
        remaining: auth.remaining,
    }))
}

/// Record one completed chargeable action and report the remaining
/// headroom.
pub async fn record_usage(
    State(state): State<AppState>,
    Json(req): Json<RecordUsageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recorded = state
        .quota
        .record_usage(req.user_id, state.config.quota.free_limit)
        .await?;

    Ok(Json(RecordUsageResponse {
        count: recorded.count,
        remaining: recorded.remaining,
    }))
}

/// Accept feedback and grant the one-per-period bonus when eligible.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Feedback content must not be empty"
        )));
    }

    let outcome = state
        .quota
        .submit_feedback(
            req.user_id,
            content,
            state.config.quota.free_limit,
            state.config.quota.bonus_amount,
        )
        .await?;

    Ok(Json(FeedbackResponse {
        outcome: outcome.as_str().to_string(),
        count: outcome.count(),
    }))
}
