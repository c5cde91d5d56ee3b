//! Quota decision types and per-period aggregates.
//!
//! The usage ledger itself is the `usage_counters` table; its operations
//! read and return bare counts, so no row struct is materialized for it.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of a pre-flight quota check. A check, not a reservation: the
/// caller records usage separately, after the chargeable action succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    LimitExceeded,
}

/// Result of `authorize`: the decision plus the counter state it was
/// derived from.
#[derive(Debug, Clone, Copy)]
pub struct Authorization {
    pub decision: Decision,
    pub count: i32,
    pub remaining: i32,
}

/// Result of `record_usage`: the post-increment counter and the headroom
/// left under the free limit (floored at 0).
#[derive(Debug, Clone, Copy)]
pub struct RecordedUsage {
    pub count: i32,
    pub remaining: i32,
}

/// Aggregate usage statistics for one period, read in a single snapshot.
#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct PeriodStats {
    pub users_total: i64,
    pub users_at_limit: i64,
    pub total_requests: i64,
    pub feedback_count: i64,
}
