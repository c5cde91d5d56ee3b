//! Database service for quota-service.

use crate::models::{BonusGrant, FeedbackRecord, Period, PeriodStats};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper. Created once at startup and shared;
/// all coordination between concurrent callers happens in Postgres.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "quota-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::StoreUnavailable(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(anyhow::anyhow!("Health check failed: {}", e))
            })?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Usage Ledger
    // -------------------------------------------------------------------------

    /// Number of chargeable actions the user has consumed in the period.
    /// A missing row is a normal miss, not an error, and reads as 0.
    #[instrument(skip(self), fields(user_id = user_id, period = %period))]
    pub async fn get_count(&self, user_id: i64, period: &Period) -> Result<i32, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_count"])
            .start_timer();

        let count: Option<i32> = sqlx::query_scalar(
            "SELECT count FROM usage_counters WHERE user_id = $1 AND period = $2",
        )
        .bind(user_id)
        .bind(period.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(anyhow::anyhow!("Failed to get count: {}", e)))?;

        timer.observe_duration();

        Ok(count.unwrap_or(0))
    }

    /// Atomically create-or-increment the counter and return the new value.
    /// A single upsert statement: the row lock serializes concurrent
    /// increments on the same key, so no update is ever lost.
    #[instrument(skip(self), fields(user_id = user_id, period = %period))]
    pub async fn increment_count(&self, user_id: i64, period: &Period) -> Result<i32, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["increment_count"])
            .start_timer();

        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO usage_counters (user_id, period, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, period)
            DO UPDATE SET count = usage_counters.count + 1, updated_utc = NOW()
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(period.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to increment count: {}", e))
        })?;

        timer.observe_duration();

        Ok(count)
    }

    /// Zero every counter in the given period. Feedback records are left
    /// untouched. Returns the number of counters reset.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn reset_period(&self, period: &Period) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["reset_period"])
            .start_timer();

        let result = sqlx::query(
            "UPDATE usage_counters SET count = 0, updated_utc = NOW() WHERE period = $1",
        )
        .bind(period.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to reset period: {}", e))
        })?;

        timer.observe_duration();

        info!(period = %period, counters_reset = result.rows_affected(), "Period counters reset");

        Ok(result.rows_affected())
    }

    /// Delete every usage and feedback record, in every period. One
    /// transaction; irreversible.
    #[instrument(skip(self))]
    pub async fn purge_all(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["purge_all"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM feedback_messages")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(anyhow::anyhow!("Failed to purge feedback: {}", e))
            })?;

        sqlx::query("DELETE FROM usage_counters")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(anyhow::anyhow!("Failed to purge counters: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!("All usage and feedback records purged");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Feedback Ledger
    // -------------------------------------------------------------------------

    /// Whether the user already submitted feedback in the period.
    #[instrument(skip(self), fields(user_id = user_id, period = %period))]
    pub async fn has_feedback(&self, user_id: i64, period: &Period) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["has_feedback"])
            .start_timer();

        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM feedback_messages WHERE user_id = $1 AND period = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(period.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to check feedback: {}", e))
        })?;

        timer.observe_duration();

        Ok(exists.is_some())
    }

    /// Store feedback and reduce the user's counter by `bonus_amount`,
    /// floored at 0, as one transaction spanning both tables. At most one
    /// grant per (user, period): the existence check runs inside the
    /// transaction, and the uniqueness constraint on feedback_messages
    /// rejects the insert if a concurrent grant won the race — both paths
    /// report `AlreadyGranted` with no mutation.
    #[instrument(skip(self, content), fields(user_id = user_id, period = %period))]
    pub async fn grant_bonus(
        &self,
        user_id: i64,
        period: &Period,
        content: &str,
        bonus_amount: i32,
    ) -> Result<BonusGrant, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["grant_bonus"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM feedback_messages WHERE user_id = $1 AND period = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(period.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to check feedback: {}", e))
        })?;

        if existing.is_some() {
            tx.rollback().await.ok();
            timer.observe_duration();
            return Ok(BonusGrant::AlreadyGranted);
        }

        let inserted = sqlx::query(
            "INSERT INTO feedback_messages (user_id, period, content) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(period.as_str())
        .bind(content)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                // A concurrent submission committed first; treat as the
                // idempotent duplicate it is.
                tx.rollback().await.ok();
                timer.observe_duration();
                return Ok(BonusGrant::AlreadyGranted);
            }
            Err(e) => {
                return Err(AppError::StoreUnavailable(anyhow::anyhow!(
                    "Failed to insert feedback: {}",
                    e
                )));
            }
        }

        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO usage_counters (user_id, period, count)
            VALUES ($1, $2, 0)
            ON CONFLICT (user_id, period)
            DO UPDATE SET count = GREATEST(usage_counters.count - $3, 0), updated_utc = NOW()
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(period.as_str())
        .bind(bonus_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to apply bonus: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            user_id = user_id,
            period = %period,
            bonus_amount = bonus_amount,
            new_count = count,
            "Feedback bonus granted"
        );

        Ok(BonusGrant::Granted { count })
    }

    /// All feedback submitted in the period, newest first.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn list_feedback(&self, period: &Period) -> Result<Vec<FeedbackRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_feedback"])
            .start_timer();

        let records = sqlx::query_as::<_, FeedbackRecord>(
            r#"
            SELECT feedback_id, user_id, period, content, created_utc
            FROM feedback_messages
            WHERE period = $1
            ORDER BY created_utc DESC, feedback_id DESC
            "#,
        )
        .bind(period.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(anyhow::anyhow!("Failed to list feedback: {}", e))
        })?;

        timer.observe_duration();

        Ok(records)
    }

    // -------------------------------------------------------------------------
    // Aggregation
    // -------------------------------------------------------------------------

    /// Aggregate statistics for one period. A single statement, so all
    /// four aggregates come from the same snapshot and never mix with an
    /// in-flight increment.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn period_stats(
        &self,
        period: &Period,
        free_limit: i32,
    ) -> Result<PeriodStats, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["period_stats"])
            .start_timer();

        let stats = sqlx::query_as::<_, PeriodStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM usage_counters WHERE period = $1) AS users_total,
                (SELECT COUNT(*) FROM usage_counters WHERE period = $1 AND count >= $2) AS users_at_limit,
                (SELECT COALESCE(SUM(count), 0) FROM usage_counters WHERE period = $1) AS total_requests,
                (SELECT COUNT(*) FROM feedback_messages WHERE period = $1) AS feedback_count
            "#,
        )
        .bind(period.as_str())
        .bind(free_limit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(anyhow::anyhow!("Failed to get stats: {}", e)))?;

        timer.observe_duration();

        Ok(stats)
    }
}
