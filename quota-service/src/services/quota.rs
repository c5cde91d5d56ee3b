//! Quota orchestration over the usage and feedback ledgers.

use crate::models::{
    Authorization, BonusGrant, Decision, FeedbackOutcome, FeedbackRecord, Period, PeriodStats,
    RecordedUsage,
};
use crate::services::metrics::{record_decision, record_feedback_outcome, record_reset};
use crate::services::Database;
use service_core::error::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Business logic composing the two ledgers. Holds no counter state of its
/// own; every operation resolves the current period and pushes coordination
/// into the store's transactional guarantees.
pub struct QuotaService {
    db: Arc<Database>,
    /// Pending confirmation for the irreversible full reset. Issued by
    /// `begin_full_reset`, consumed by a successful `reset_all`.
    reset_token: Mutex<Option<String>>,
}

impl QuotaService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            reset_token: Mutex::new(None),
        }
    }

    fn validate_limit(name: &str, value: i32) -> Result<(), AppError> {
        if value < 1 {
            return Err(AppError::InvalidConfiguration(anyhow::anyhow!(
                "{} must be a positive integer, got {}",
                name,
                value
            )));
        }
        Ok(())
    }

    /// Check whether the user may perform another chargeable action in the
    /// current period. A check, not a reservation: nothing is mutated, and
    /// the caller records usage only after the external action succeeded.
    pub async fn authorize(&self, user_id: i64, free_limit: i32) -> Result<Authorization, AppError> {
        self.authorize_in(user_id, &Period::current(), free_limit)
            .await
    }

    #[instrument(skip(self), fields(user_id = user_id, period = %period))]
    pub async fn authorize_in(
        &self,
        user_id: i64,
        period: &Period,
        free_limit: i32,
    ) -> Result<Authorization, AppError> {
        Self::validate_limit("free_limit", free_limit)?;

        let count = self.db.get_count(user_id, period).await?;
        let decision = if count < free_limit {
            Decision::Allowed
        } else {
            Decision::LimitExceeded
        };

        record_decision(match decision {
            Decision::Allowed => "allowed",
            Decision::LimitExceeded => "limit_exceeded",
        });

        Ok(Authorization {
            decision,
            count,
            remaining: (free_limit - count).max(0),
        })
    }

    /// Record one completed chargeable action. Call at most once per
    /// successfully performed action; a failed or cancelled action must
    /// not reach this method.
    pub async fn record_usage(
        &self,
        user_id: i64,
        free_limit: i32,
    ) -> Result<RecordedUsage, AppError> {
        self.record_usage_in(user_id, &Period::current(), free_limit)
            .await
    }

    #[instrument(skip(self), fields(user_id = user_id, period = %period))]
    pub async fn record_usage_in(
        &self,
        user_id: i64,
        period: &Period,
        free_limit: i32,
    ) -> Result<RecordedUsage, AppError> {
        Self::validate_limit("free_limit", free_limit)?;

        let count = self.db.increment_count(user_id, period).await?;

        Ok(RecordedUsage {
            count,
            remaining: (free_limit - count).max(0),
        })
    }

    /// Accept a feedback submission and grant the one-per-period bonus.
    /// A user who already received this period's bonus gets
    /// `AlreadyGranted` no matter what their counter reads now; otherwise
    /// only a user at or above the free limit is eligible, and under the
    /// limit the call is a no-op reporting `NotEligible`. Both pre-checks
    /// are advisory — `grant_bonus` re-checks inside its transaction.
    pub async fn submit_feedback(
        &self,
        user_id: i64,
        content: &str,
        free_limit: i32,
        bonus_amount: i32,
    ) -> Result<FeedbackOutcome, AppError> {
        self.submit_feedback_in(user_id, &Period::current(), content, free_limit, bonus_amount)
            .await
    }

    #[instrument(skip(self, content), fields(user_id = user_id, period = %period))]
    pub async fn submit_feedback_in(
        &self,
        user_id: i64,
        period: &Period,
        content: &str,
        free_limit: i32,
        bonus_amount: i32,
    ) -> Result<FeedbackOutcome, AppError> {
        Self::validate_limit("free_limit", free_limit)?;
        Self::validate_limit("bonus_amount", bonus_amount)?;

        let count = self.db.get_count(user_id, period).await?;

        if self.db.has_feedback(user_id, period).await? {
            let outcome = FeedbackOutcome::AlreadyGranted { count };
            record_feedback_outcome(outcome.as_str());
            return Ok(outcome);
        }

        if count < free_limit {
            let outcome = FeedbackOutcome::NotEligible { count };
            record_feedback_outcome(outcome.as_str());
            return Ok(outcome);
        }

        let outcome = match self
            .db
            .grant_bonus(user_id, period, content, bonus_amount)
            .await?
        {
            BonusGrant::Granted { count } => FeedbackOutcome::Granted { count },
            BonusGrant::AlreadyGranted => {
                let count = self.db.get_count(user_id, period).await?;
                FeedbackOutcome::AlreadyGranted { count }
            }
        };

        record_feedback_outcome(outcome.as_str());

        Ok(outcome)
    }

    /// Read-only aggregate statistics for one period.
    pub async fn stats(&self, free_limit: i32) -> Result<PeriodStats, AppError> {
        self.stats_in(&Period::current(), free_limit).await
    }

    #[instrument(skip(self), fields(period = %period))]
    pub async fn stats_in(
        &self,
        period: &Period,
        free_limit: i32,
    ) -> Result<PeriodStats, AppError> {
        Self::validate_limit("free_limit", free_limit)?;
        self.db.period_stats(period, free_limit).await
    }

    /// The feedback collected in one period, for the admin to read.
    pub async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, AppError> {
        self.list_feedback_in(&Period::current()).await
    }

    #[instrument(skip(self), fields(period = %period))]
    pub async fn list_feedback_in(&self, period: &Period) -> Result<Vec<FeedbackRecord>, AppError> {
        self.db.list_feedback(period).await
    }

    /// Administrative: zero every counter in the current period.
    pub async fn reset_period_limits(&self) -> Result<u64, AppError> {
        self.reset_period_limits_in(&Period::current()).await
    }

    #[instrument(skip(self), fields(period = %period))]
    pub async fn reset_period_limits_in(&self, period: &Period) -> Result<u64, AppError> {
        let reset = self.db.reset_period(period).await?;
        record_reset("period");
        Ok(reset)
    }

    /// Issue the confirmation token that arms the irreversible full reset.
    /// Re-issuing replaces any previously pending token.
    pub async fn begin_full_reset(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut pending = self.reset_token.lock().await;
        *pending = Some(token.clone());
        info!("Full reset armed, awaiting confirmation");
        token
    }

    /// Delete every usage and feedback record, in every period. Runs only
    /// when `confirmation` exactly matches the pending token; the token is
    /// consumed by a successful reset.
    #[instrument(skip(self, confirmation))]
    pub async fn reset_all(&self, confirmation: &str) -> Result<(), AppError> {
        {
            let mut pending = self.reset_token.lock().await;
            let matches = match pending.as_deref() {
                Some(token) => bool::from(token.as_bytes().ct_eq(confirmation.as_bytes())),
                None => false,
            };
            if !matches {
                warn!("Full reset rejected: confirmation token mismatch");
                return Err(AppError::Forbidden(anyhow::anyhow!(
                    "Full reset requires a matching confirmation token"
                )));
            }
            *pending = None;
        }

        self.db.purge_all().await?;
        record_reset("full");
        Ok(())
    }
}
