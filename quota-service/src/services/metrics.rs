//! Metrics module for quota-service.
//! Provides Prometheus metrics for ledger operations and quota outcomes.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("quota_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Authorization decisions counter
pub static QUOTA_DECISIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Feedback submission outcomes counter
pub static FEEDBACK_OUTCOMES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Administrative resets counter
pub static ADMIN_RESETS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    QUOTA_DECISIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "quota_decisions_total",
                "Total authorization decisions by outcome"
            ),
            &["decision"]
        )
        .expect("Failed to register QUOTA_DECISIONS_TOTAL")
    });

    FEEDBACK_OUTCOMES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "quota_feedback_outcomes_total",
                "Total feedback submissions by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register FEEDBACK_OUTCOMES_TOTAL")
    });

    ADMIN_RESETS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("quota_admin_resets_total", "Total administrative resets"),
            &["kind"]
        )
        .expect("Failed to register ADMIN_RESETS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record an authorization decision.
pub fn record_decision(decision: &str) {
    if let Some(counter) = QUOTA_DECISIONS_TOTAL.get() {
        counter.with_label_values(&[decision]).inc();
    }
}

/// Record a feedback submission outcome.
pub fn record_feedback_outcome(outcome: &str) {
    if let Some(counter) = FEEDBACK_OUTCOMES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record an administrative reset.
pub fn record_reset(kind: &str) {
    if let Some(counter) = ADMIN_RESETS_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}
