//! Feedback model and bonus grant outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored feedback submission. Immutable once written; at most one per
/// (user, period), enforced by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRecord {
    pub feedback_id: i64,
    pub user_id: i64,
    pub period: String,
    pub content: String,
    pub created_utc: DateTime<Utc>,
}

/// Result of the transactional bonus grant at the store level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusGrant {
    /// Feedback stored and the counter reduced; carries the new count.
    Granted { count: i32 },
    /// Feedback already existed for this (user, period); nothing mutated.
    AlreadyGranted,
}

/// Caller-facing outcome of a feedback submission. All three are normal
/// outcomes, not errors; each carries the counter as it stands after the
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Granted { count: i32 },
    AlreadyGranted { count: i32 },
    /// The user is still under the free limit; feedback-for-bonus is a
    /// relief valve, not a general comment box.
    NotEligible { count: i32 },
}

impl FeedbackOutcome {
    /// Stable wire token for DTOs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackOutcome::Granted { .. } => "granted",
            FeedbackOutcome::AlreadyGranted { .. } => "already_granted",
            FeedbackOutcome::NotEligible { .. } => "not_eligible",
        }
    }

    pub fn count(&self) -> i32 {
        match self {
            FeedbackOutcome::Granted { count }
            | FeedbackOutcome::AlreadyGranted { count }
            | FeedbackOutcome::NotEligible { count } => *count,
        }
    }
}
