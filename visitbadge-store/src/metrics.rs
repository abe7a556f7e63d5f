//! Counter store metrics.
//!
//! This module provides metrics for durable counter store operations.
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Naming Pattern
//!
//! All metrics follow the pattern: `visitbadge_store_{metric}` and carry a
//! `store` label (the store name) and an `op` label (`increment`, `get`, `add`).
//!
//! - `visitbadge_store_operations_total` - operations issued
//! - `visitbadge_store_errors_total` - operations that failed or timed out
//! - `visitbadge_store_duration_seconds` - round-trip latency

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Zero-cost timer for metrics collection.
///
/// When the `metrics` feature is enabled, this captures the start time.
/// When disabled, this is a zero-sized struct with no overhead.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Create a new timer, capturing the current instant if metrics enabled.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time since creation, `Duration::ZERO` without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for total store operations counter.
    pub static ref STORE_OPERATIONS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "visitbadge_store_operations_total",
            "Total number of counter store operations."
        );
        "visitbadge_store_operations_total"
    };

    /// Metric name for failed store operations counter.
    pub static ref STORE_ERRORS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "visitbadge_store_errors_total",
            "Total number of counter store operations that failed or timed out."
        );
        "visitbadge_store_errors_total"
    };

    /// Metric name for store latency histogram.
    pub static ref STORE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "visitbadge_store_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of counter store round trips in seconds."
        );
        "visitbadge_store_duration_seconds"
    };
}

/// Record a finished store operation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_operation(store: &str, op: &'static str, duration: Duration, ok: bool) {
    metrics::counter!(*STORE_OPERATIONS_TOTAL, "store" => store.to_string(), "op" => op)
        .increment(1);
    metrics::histogram!(*STORE_DURATION, "store" => store.to_string(), "op" => op)
        .record(duration.as_secs_f64());
    if !ok {
        metrics::counter!(*STORE_ERRORS_TOTAL, "store" => store.to_string(), "op" => op)
            .increment(1);
    }
}

/// Record a finished store operation (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_operation(_store: &str, _op: &'static str, _duration: Duration, _ok: bool) {}
