//! Administrative endpoints: stats and resets.

use crate::dtos::{
    BeginResetResponse, FeedbackListResponse, ResetAllRequest, ResetLimitsResponse, StatsResponse,
};
use crate::models::Period;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

/// Aggregate statistics for the current period.
pub async fn period_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let period = Period::current();
    let stats = state
        .quota
        .stats_in(&period, state.config.quota.free_limit)
        .await?;

    Ok(Json(StatsResponse {
        period: period.to_string(),
        users_total: stats.users_total,
        users_at_limit: stats.users_at_limit,
        total_requests: stats.total_requests,
        feedback_count: stats.feedback_count,
    }))
}

/// The feedback submitted this period, newest first.
pub async fn list_feedback(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let period = Period::current();
    let feedback = state.quota.list_feedback_in(&period).await?;

    Ok(Json(FeedbackListResponse {
        period: period.to_string(),
        feedback,
    }))
}

/// Zero every counter in the current period, leaving feedback intact.
pub async fn reset_limits(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let period = Period::current();
    let counters_reset = state.quota.reset_period_limits_in(&period).await?;

    Ok(Json(ResetLimitsResponse {
        period: period.to_string(),
        counters_reset,
    }))
}

/// Arm the irreversible full reset and hand back the confirmation token
/// the operator must echo to run it.
pub async fn begin_full_reset(State(state): State<AppState>) -> impl IntoResponse {
    let confirmation_token = state.quota.begin_full_reset().await;
    Json(BeginResetResponse { confirmation_token })
}

/// Delete every usage and feedback record. Requires the exact pending
/// confirmation token; anything else is refused with no mutation.
pub async fn reset_all(
    State(state): State<AppState>,
    Json(req): Json<ResetAllRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.quota.reset_all(&req.confirmation_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
