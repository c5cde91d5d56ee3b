//! Calendar-month accounting period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month-granularity accounting window, identified by a `"YYYY-MM"` token
/// derived from UTC wall-clock time. Never stored as state on its own;
/// recomputed at the moment of each ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period(String);

impl Period {
    /// Period containing the current UTC instant.
    pub fn current() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Period containing the given instant. Pure; two timestamps in the
    /// same UTC month always yield the same token.
    pub fn from_utc(ts: DateTime<Utc>) -> Self {
        Period(ts.format("%Y-%m").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
