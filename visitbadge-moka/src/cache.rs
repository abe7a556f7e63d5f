//! Counter cache implementation.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tracing::{debug, trace, warn};
use visitbadge_core::tally::{compare, tally};
use visitbadge_core::{CacheKey, DetachedOffload, Digits, Offload};
use visitbadge_store::{CounterStore, StoreResult, bounded};

use crate::builder::{CounterCacheBuilder, NoCapacity};
use crate::error::CacheError;
use crate::metrics;

/// In-memory view counter cache in front of a durable [`CounterStore`].
///
/// `CounterCache` answers most `bump` calls without a store round trip: a
/// cached count is incremented locally with [`tally`] and the matching store
/// increment is offloaded to the background. Roughly one resync in ten (those
/// where the store's answer ends in `0`) overwrites the local entry with the
/// store's value, so counts converge across instances without forcing every
/// request through the store.
///
/// # Type Parameters
///
/// * `St` - Durable store. Implements [`CounterStore`].
/// * `O` - Background executor for resyncs. Implements [`Offload`].
///   Default: [`DetachedOffload`].
///
/// # Examples
///
/// ```
/// use visitbadge_core::CacheKey;
/// use visitbadge_moka::CounterCache;
/// use visitbadge_store::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = CounterCache::builder(MemoryStore::new())
///     .max_entries(10_000)
///     .build();
///
/// let key = CacheKey::digest("my-page", "secret");
/// assert_eq!(cache.bump(&key).await.unwrap().as_str(), "1");
/// assert_eq!(cache.bump(&key).await.unwrap().as_str(), "2");
/// # }
/// ```
///
/// # Consistency
///
/// - Per-key read-tally-write is atomic (moka's per-key compute lock);
///   different keys never contend.
/// - A cached count never decreases: a resync only overwrites the entry when
///   the store's value is at least the local one.
/// - Counts can lag the store between resyncs, and a resync lost at shutdown
///   is not retried.
pub struct CounterCache<St, O = DetachedOffload>
where
    St: CounterStore,
    O: Offload,
{
    pub(crate) shared: Arc<Shared<St>>,
    pub(crate) offload: O,
}

pub(crate) struct Shared<St> {
    pub(crate) entries: Cache<CacheKey, Bytes>,
    pub(crate) store: St,
    pub(crate) store_timeout: Duration,
}

impl<St, O> Clone for CounterCache<St, O>
where
    St: CounterStore,
    O: Offload,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            offload: self.offload.clone(),
        }
    }
}

impl<St, O> std::fmt::Debug for CounterCache<St, O>
where
    St: CounterStore,
    O: Offload,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterCache")
            .field("store", &self.shared.store.name())
            .field("entries", &self.shared.entries.entry_count())
            .field("store_timeout", &self.shared.store_timeout)
            .field("offload", &std::any::type_name::<O>())
            .finish()
    }
}

impl<St> CounterCache<St, DetachedOffload>
where
    St: CounterStore + 'static,
{
    /// Creates a new builder around `store`.
    ///
    /// A capacity must be chosen with
    /// [`max_entries()`](CounterCacheBuilder::max_entries) or
    /// [`max_bytes()`](CounterCacheBuilder::max_bytes) before `build()`.
    pub fn builder(store: St) -> CounterCacheBuilder<NoCapacity, St, DetachedOffload> {
        CounterCacheBuilder::new(store)
    }
}

impl<St, O> CounterCache<St, O>
where
    St: CounterStore + 'static,
    O: Offload,
{
    /// Counts one view of `key` and returns the new count.
    ///
    /// On a hit the cached count is tallied in place and returned
    /// immediately; the store increment runs in the background. On a miss,
    /// or when the cached entry is malformed, the store is incremented
    /// synchronously and its answer cached.
    pub async fn bump(&self, key: &CacheKey) -> Result<Digits, CacheError> {
        let hit = AtomicBool::new(false);
        let hit_flag = &hit;
        let shared = &*self.shared;

        let comp = shared
            .entries
            .entry(key.clone())
            .and_try_compute_with(move |current| async move {
                if let Some(entry) = current {
                    match tally(entry.value()) {
                        Ok(next) => {
                            hit_flag.store(true, AtomicOrdering::Relaxed);
                            return Ok(Op::Put(Bytes::from(next)));
                        }
                        Err(error) => {
                            warn!(%key, %error, "Discarding malformed cached counter");
                        }
                    }
                }
                let count = shared.increment(key).await?;
                Ok::<_, CacheError>(Op::Put(Bytes::from(count.to_string())))
            })
            .await?;

        let hit = hit.load(AtomicOrdering::Relaxed);
        metrics::record_bump(hit);

        let stored = comp
            .into_entry()
            .map(|entry| entry.into_value())
            .unwrap_or_default();
        let count = Digits::parse(&stored)?;

        if hit {
            trace!(%key, %count, "Counter tallied in cache");
            self.spawn_resync(key.clone());
        } else {
            debug!(%key, %count, "Counter cached from store");
        }
        Ok(count)
    }

    /// Reads the current count of `key` without counting a view.
    ///
    /// Goes straight to the store and leaves the cache untouched; a key that
    /// was never counted reads as `0`.
    pub async fn peek(&self, key: &CacheKey) -> Result<Digits, CacheError> {
        let shared = &self.shared;
        let value = bounded(
            shared.store.name(),
            "get",
            shared.store_timeout,
            shared.store.get(key),
        )
        .await?;
        Ok(Digits::from(value))
    }

    /// Adds `delta` views to `key` in the store, e.g. to restore lost counts.
    ///
    /// Negative deltas are rejected by the store. The cached entry is
    /// dropped so the next bump reloads the corrected value.
    pub async fn recover(&self, key: &CacheKey, delta: i64) -> Result<Digits, CacheError> {
        let shared = &self.shared;
        let value = bounded(
            shared.store.name(),
            "add",
            shared.store_timeout,
            shared.store.increment_by(key, delta),
        )
        .await?;
        shared.entries.invalidate(key).await;
        Ok(Digits::from(value))
    }

    /// Returns the cached count of `key`, if any, without touching the store.
    pub async fn cached(&self, key: &CacheKey) -> Option<Bytes> {
        self.shared.entries.get(key).await
    }

    /// The underlying moka cache.
    pub fn entries(&self) -> &Cache<CacheKey, Bytes> {
        &self.shared.entries
    }

    /// The durable store behind this cache.
    pub fn store(&self) -> &St {
        &self.shared.store
    }

    /// Approximate number of cached counters.
    pub fn entry_count(&self) -> u64 {
        self.shared.entries.entry_count()
    }

    /// Runs moka's pending maintenance (expiry, eviction, listeners) now.
    pub async fn run_pending_tasks(&self) {
        self.shared.entries.run_pending_tasks().await;
    }

    /// Publishes the entry count and weighted size gauges.
    pub fn report_capacity(&self) {
        metrics::record_capacity(
            self.shared.entries.entry_count(),
            self.shared.entries.weighted_size(),
        );
    }

    fn spawn_resync(&self, key: CacheKey) {
        let shared = Arc::clone(&self.shared);
        self.offload.spawn("resync", async move {
            shared.resync(key).await;
        });
    }
}

impl<St> Shared<St>
where
    St: CounterStore,
{
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64> {
        bounded(
            self.store.name(),
            "increment",
            self.store_timeout,
            self.store.increment(key),
        )
        .await
    }

    /// Mirrors one tallied view into the store and, when sampled, adopts the
    /// store's count locally.
    async fn resync(&self, key: CacheKey) {
        let authoritative = match self.increment(&key).await {
            Ok(value) => Digits::from(value),
            Err(error) => {
                warn!(%key, %error, "Counter resync failed");
                metrics::record_resync("failed");
                return;
            }
        };

        if !authoritative.ends_with_zero() {
            metrics::record_resync("skipped");
            return;
        }

        let store_count = authoritative.clone();
        let comp = self
            .entries
            .entry(key.clone())
            .and_compute_with(move |current| async move {
                match current {
                    // Evicted meanwhile: the next bump reloads from the store.
                    None => Op::Nop,
                    Some(entry)
                        if compare(entry.value(), store_count.as_bytes()) == Ordering::Greater =>
                    {
                        Op::Nop
                    }
                    Some(_) => Op::Put(Bytes::copy_from_slice(store_count.as_bytes())),
                }
            })
            .await;

        match comp {
            CompResult::ReplacedWith(_) => {
                debug!(%key, count = %authoritative, "Counter resynced from store");
                metrics::record_resync("applied");
            }
            _ => {
                trace!(%key, count = %authoritative, "Counter resync left local value");
                metrics::record_resync("skipped");
            }
        }
    }
}
