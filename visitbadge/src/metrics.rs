//! Badge service metrics.
//!
//! Enable the `metrics` feature to record them; without it every `record_*`
//! function is an empty inline stub.
//!
//! ## Metrics
//!
//! - `visitbadge_badges_total` - badges served, labelled `outcome`
//!   (`counted`, `peeked`, `error`)
//! - `visitbadge_badge_duration_seconds` - time to serve one badge
//! - `visitbadge_render_total` - render results, labelled `outcome`
//!   (`rendered`, `fallback`, `placeholder`)
//! - `visitbadge_render_duration_seconds` - one render round trip, labelled `endpoint`
//! - `visitbadge_offload_tasks_spawned_total` / `_completed_total` / `_timeout_total`
//! - `visitbadge_offload_tasks_active` - running offloaded tasks (gauge)
//! - `visitbadge_offload_task_duration_seconds`
//!
//! All offload metrics carry a `kind` label.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Badges served.
    pub static ref BADGES_TOTAL: &'static str = {
        metrics::describe_counter!(
            "visitbadge_badges_total",
            "Total number of badges served by outcome."
        );
        "visitbadge_badges_total"
    };

    /// Badge serving latency.
    pub static ref BADGE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "visitbadge_badge_duration_seconds",
            metrics::Unit::Seconds,
            "Time to count and render one badge."
        );
        "visitbadge_badge_duration_seconds"
    };

    /// Render results.
    pub static ref RENDER_TOTAL: &'static str = {
        metrics::describe_counter!(
            "visitbadge_render_total",
            "Total number of render calls by outcome."
        );
        "visitbadge_render_total"
    };

    /// Render round trip latency.
    pub static ref RENDER_DURATION: &'static str = {
        metrics::describe_histogram!(
            "visitbadge_render_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of one request to a badge renderer."
        );
        "visitbadge_render_duration_seconds"
    };

    /// Offloaded tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "visitbadge_offload_tasks_spawned_total",
            "Total number of offloaded tasks spawned."
        );
        "visitbadge_offload_tasks_spawned_total"
    };

    /// Offloaded tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "visitbadge_offload_tasks_completed_total",
            "Total number of offloaded tasks that ran to completion."
        );
        "visitbadge_offload_tasks_completed_total"
    };

    /// Offloaded tasks cancelled by their timeout policy.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "visitbadge_offload_tasks_timeout_total",
            "Total number of offloaded tasks cancelled by timeout."
        );
        "visitbadge_offload_tasks_timeout_total"
    };

    /// Offloaded tasks currently running.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "visitbadge_offload_tasks_active",
            "Number of offloaded tasks currently running."
        );
        "visitbadge_offload_tasks_active"
    };

    /// Offloaded task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "visitbadge_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offloaded tasks."
        );
        "visitbadge_offload_task_duration_seconds"
    };
}

/// Record one served badge.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_badge(outcome: &'static str, duration: Duration) {
    metrics::counter!(*BADGES_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(*BADGE_DURATION).record(duration.as_secs_f64());
}

/// Record one served badge (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_badge(_outcome: &'static str, _duration: Duration) {}

/// Record the outcome of one render call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_render(outcome: &'static str) {
    metrics::counter!(*RENDER_TOTAL, "outcome" => outcome).increment(1);
}

/// Record the outcome of one render call (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_render(_outcome: &'static str) {}

/// Record one render round trip.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_render_duration(endpoint: &str, duration: Duration) {
    metrics::histogram!(*RENDER_DURATION, "endpoint" => endpoint.to_owned())
        .record(duration.as_secs_f64());
}

/// Record one render round trip (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_render_duration(_endpoint: &str, _duration: Duration) {}

/// Record a spawned offload task.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_spawned(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_owned()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).increment(1.0);
}

/// Record a spawned offload task (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_spawned(_kind: &str) {}

/// Record an offload task that ran to completion.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_completed(kind: &str, duration: Duration) {
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.to_owned()).increment(1);
    finish_offload(kind, duration);
}

/// Record an offload task that ran to completion (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_completed(_kind: &str, _duration: Duration) {}

/// Record an offload task cancelled by its timeout.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_timeout(kind: &str, duration: Duration) {
    metrics::counter!(*OFFLOAD_TASKS_TIMEOUT, "kind" => kind.to_owned()).increment(1);
    finish_offload(kind, duration);
}

/// Record an offload task cancelled by its timeout (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_timeout(_kind: &str, _duration: Duration) {}

#[cfg(feature = "metrics")]
fn finish_offload(kind: &str, duration: Duration) {
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_owned())
        .record(duration.as_secs_f64());
}
