//! Request/response shapes for the admin endpoints.

use crate::models::FeedbackRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub period: String,
    pub users_total: i64,
    pub users_at_limit: i64,
    pub total_requests: i64,
    pub feedback_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub period: String,
    pub feedback: Vec<FeedbackRecord>,
}

#[derive(Debug, Serialize)]
pub struct ResetLimitsResponse {
    pub period: String,
    pub counters_reset: u64,
}

#[derive(Debug, Serialize)]
pub struct BeginResetResponse {
    pub confirmation_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetAllRequest {
    pub confirmation_token: String,
}
