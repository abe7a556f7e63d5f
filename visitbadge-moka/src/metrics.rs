//! Counter cache metrics.
//!
//! This module provides metrics for monitoring the counter cache.
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Metrics
//!
//! - `visitbadge_cache_hit_total` / `visitbadge_cache_miss_total` - bump outcomes
//! - `visitbadge_cache_resync_total` - resync results, labelled `outcome`
//!   (`applied`, `skipped`, `failed`)
//! - `visitbadge_cache_evictions_total` - removals, labelled `cause`
//! - `visitbadge_cache_entries` - current number of entries (gauge)
//! - `visitbadge_cache_size_bytes` - current weighted size (gauge)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for cache hit counter.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "visitbadge_cache_hit_total",
            "Total number of bumps served by tallying a cached counter."
        );
        "visitbadge_cache_hit_total"
    };

    /// Metric name for cache miss counter.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "visitbadge_cache_miss_total",
            "Total number of bumps that went to the counter store synchronously."
        );
        "visitbadge_cache_miss_total"
    };

    /// Metric name for resync outcome counter.
    pub static ref CACHE_RESYNC_COUNTER: &'static str = {
        metrics::describe_counter!(
            "visitbadge_cache_resync_total",
            "Total number of background resyncs by outcome."
        );
        "visitbadge_cache_resync_total"
    };

    /// Metric name for eviction counter.
    pub static ref CACHE_EVICTIONS: &'static str = {
        metrics::describe_counter!(
            "visitbadge_cache_evictions_total",
            "Total number of cached counters removed, by cause."
        );
        "visitbadge_cache_evictions_total"
    };

    /// Metric name for cache entry count gauge.
    pub static ref CACHE_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "visitbadge_cache_entries",
            "Current number of entries in the counter cache."
        );
        "visitbadge_cache_entries"
    };

    /// Metric name for cache size gauge.
    pub static ref CACHE_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "visitbadge_cache_size_bytes",
            "Current weighted size of the counter cache."
        );
        "visitbadge_cache_size_bytes"
    };
}

/// Record the outcome of one bump.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_bump(hit: bool) {
    if hit {
        metrics::counter!(*CACHE_HIT_COUNTER).increment(1);
    } else {
        metrics::counter!(*CACHE_MISS_COUNTER).increment(1);
    }
}

/// Record the outcome of one bump (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_bump(_hit: bool) {}

/// Record the outcome of one background resync.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_resync(outcome: &'static str) {
    metrics::counter!(*CACHE_RESYNC_COUNTER, "outcome" => outcome).increment(1);
}

/// Record the outcome of one background resync (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_resync(_outcome: &'static str) {}

/// Record one removal from the cache.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_eviction(cause: &'static str) {
    metrics::counter!(*CACHE_EVICTIONS, "cause" => cause).increment(1);
}

/// Record one removal from the cache (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_eviction(_cause: &'static str) {}

/// Record current cache capacity metrics.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(entries: u64, size_bytes: u64) {
    metrics::gauge!(*CACHE_ENTRIES).set(entries as f64);
    metrics::gauge!(*CACHE_SIZE_BYTES).set(size_bytes as f64);
}

/// Record current cache capacity metrics (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_entries: u64, _size_bytes: u64) {}
