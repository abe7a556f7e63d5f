//! In-process counter store.
//!
//! [`MemoryStore`] keeps counts in a [`DashMap`]. It satisfies the
//! [`CounterStore`] contract within one process only, so it is meant for
//! development, single-instance deployments and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use visitbadge_core::CacheKey;

use crate::{CounterStore, StoreResult};

/// Per-operation call counters, useful for asserting store traffic.
#[derive(Debug, Default)]
pub struct StoreCounters {
    increment_count: AtomicUsize,
    get_count: AtomicUsize,
    add_count: AtomicUsize,
}

impl StoreCounters {
    /// Number of `increment` calls.
    pub fn increment_count(&self) -> usize {
        self.increment_count.load(Ordering::SeqCst)
    }

    /// Number of `get` calls.
    pub fn get_count(&self) -> usize {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Number of `add` calls.
    pub fn add_count(&self) -> usize {
        self.add_count.load(Ordering::SeqCst)
    }
}

/// Counter store backed by a concurrent hash map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    counts: Arc<DashMap<CacheKey, u64>>,
    counters: Arc<StoreCounters>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value` directly, bypassing the increment contract.
    pub fn seed(&self, key: &CacheKey, value: u64) {
        self.counts.insert(key.clone(), value);
    }

    /// Number of keys ever written.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no key was ever written.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Whether `key` exists.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.counts.contains_key(key)
    }

    /// Call counters.
    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    fn bump(&self, key: &CacheKey, delta: u64) -> u64 {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.counts.entry(key.clone()).or_insert(0);
        let next = entry.saturating_add(delta);
        *entry = next;
        next
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64> {
        self.counters.increment_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.bump(key, 1))
    }

    async fn get(&self, key: &CacheKey) -> StoreResult<u64> {
        self.counters.get_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.counts.get(key).map(|value| *value).unwrap_or(0))
    }

    async fn add(&self, key: &CacheKey, delta: u64) -> StoreResult<u64> {
        self.counters.add_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.bump(key, delta))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
