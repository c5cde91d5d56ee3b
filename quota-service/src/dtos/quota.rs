//! Request/response shapes for the quota endpoints.

use crate::models::Decision;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub decision: Decision,
    pub count: i32,
    pub remaining: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    pub count: i32,
    pub remaining: i32,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub outcome: String,
    pub count: i32,
}
