//! Builder for configuring [`CounterCache`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moka::future::{Cache, CacheBuilder};
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use tracing::{debug, warn};
use visitbadge_core::{CacheKey, DetachedOffload, Offload};
use visitbadge_store::CounterStore;

use crate::cache::{CounterCache, Shared};
use crate::metrics;

/// Default lifetime of a cached counter since it was last written.
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fixed per-entry overhead added by the byte weigher (moka metadata, `Arc`s).
const ENTRY_OVERHEAD: usize = 96;

/// Marker type: capacity has not been configured yet.
///
/// This is the initial state of a [`CounterCacheBuilder`]. You must call
/// either [`max_entries()`](CounterCacheBuilder::max_entries) or
/// [`max_bytes()`](CounterCacheBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`CounterCache`].
///
/// Use [`CounterCache::builder`] to create a new builder instance.
///
/// Capacity is mandatory and set with exactly one of
/// [`max_entries(n)`](Self::max_entries) or [`max_bytes(n)`](Self::max_bytes);
/// `build()` only exists once one of them was called.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use visitbadge_moka::CounterCache;
/// use visitbadge_store::MemoryStore;
///
/// let cache = CounterCache::builder(MemoryStore::new())
///     .max_bytes(64 * 1024 * 1024)
///     .time_to_live(Duration::from_secs(3600))
///     .store_timeout(Duration::from_millis(500))
///     .build();
/// ```
pub struct CounterCacheBuilder<Cap, St, O = DetachedOffload> {
    capacity: Cap,
    store: St,
    offload: O,
    time_to_live: Duration,
    store_timeout: Duration,
    eviction_policy: Option<EvictionPolicy>,
}

impl<St> CounterCacheBuilder<NoCapacity, St, DetachedOffload>
where
    St: CounterStore + 'static,
{
    /// Creates a new builder with no capacity configured.
    pub fn new(store: St) -> Self {
        Self {
            capacity: NoCapacity,
            store,
            offload: DetachedOffload,
            time_to_live: DEFAULT_TIME_TO_LIVE,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            eviction_policy: None,
        }
    }
}

impl<St, O> CounterCacheBuilder<NoCapacity, St, O> {
    /// Sets the maximum number of cached counters.
    pub fn max_entries(self, capacity: u64) -> CounterCacheBuilder<EntryCapacity, St, O> {
        self.with_capacity(EntryCapacity(capacity))
    }

    /// Sets the approximate memory budget in bytes.
    ///
    /// Each entry weighs its key, its digit string and a fixed overhead of
    /// roughly a hundred bytes.
    pub fn max_bytes(self, bytes: u64) -> CounterCacheBuilder<ByteCapacity, St, O> {
        self.with_capacity(ByteCapacity(bytes))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> CounterCacheBuilder<Cap, St, O> {
        CounterCacheBuilder {
            capacity,
            store: self.store,
            offload: self.offload,
            time_to_live: self.time_to_live,
            store_timeout: self.store_timeout,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap, St, O> CounterCacheBuilder<Cap, St, O> {
    /// Sets how long a counter stays cached after its last write.
    ///
    /// # Default
    ///
    /// 7 days.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }

    /// Sets the deadline applied to every store call.
    ///
    /// # Default
    ///
    /// 2 seconds.
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Sets the eviction policy for the cache.
    ///
    /// # Default
    ///
    /// [`EvictionPolicy::lru()`] for both capacity modes, so the least
    /// recently counted pages go first. TinyLFU may refuse to admit a new
    /// page at all, which would push every bump of that page to the store.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the executor used for background resyncs.
    pub fn offload<NewO>(self, offload: NewO) -> CounterCacheBuilder<Cap, St, NewO>
    where
        NewO: Offload,
    {
        CounterCacheBuilder {
            capacity: self.capacity,
            store: self.store,
            offload,
            time_to_live: self.time_to_live,
            store_timeout: self.store_timeout,
            eviction_policy: self.eviction_policy,
        }
    }

    fn base(&self, capacity: u64) -> CacheBuilder<CacheKey, Bytes, Cache<CacheKey, Bytes>> {
        let policy = self.eviction_policy.clone().unwrap_or_else(EvictionPolicy::lru);
        Cache::builder()
            .name("visitbadge-counters")
            .max_capacity(capacity)
            .time_to_live(self.time_to_live)
            .eviction_policy(policy)
            .eviction_listener(on_removal)
    }

    fn assemble(self, entries: Cache<CacheKey, Bytes>) -> CounterCache<St, O>
    where
        St: CounterStore + 'static,
        O: Offload,
    {
        CounterCache {
            shared: Arc::new(Shared {
                entries,
                store: self.store,
                store_timeout: self.store_timeout,
            }),
            offload: self.offload,
        }
    }
}

impl<St, O> CounterCacheBuilder<EntryCapacity, St, O>
where
    St: CounterStore + 'static,
    O: Offload,
{
    /// Builds the [`CounterCache`] with entry-count based capacity.
    pub fn build(self) -> CounterCache<St, O> {
        let entries = self.base(self.capacity.0).build();
        self.assemble(entries)
    }
}

impl<St, O> CounterCacheBuilder<ByteCapacity, St, O>
where
    St: CounterStore + 'static,
    O: Offload,
{
    /// Builds the [`CounterCache`] with byte-based capacity.
    pub fn build(self) -> CounterCache<St, O> {
        let entries = self.base(self.capacity.0).weigher(byte_weigher).build();
        self.assemble(entries)
    }
}

fn byte_weigher(key: &CacheKey, value: &Bytes) -> u32 {
    (key.memory_size() + value.len() + ENTRY_OVERHEAD).min(u32::MAX as usize) as u32
}

fn on_removal(key: Arc<CacheKey>, value: Bytes, cause: RemovalCause) {
    let count = String::from_utf8_lossy(&value);
    match cause {
        // Every tally replaces the entry.
        RemovalCause::Replaced => {}
        RemovalCause::Expired => {
            debug!(%key, %count, "Cached counter expired");
            metrics::record_eviction("expired");
        }
        RemovalCause::Explicit => {
            debug!(%key, %count, "Cached counter invalidated");
            metrics::record_eviction("explicit");
        }
        RemovalCause::Size => {
            warn!(%key, %count, "Cached counter evicted for capacity");
            metrics::record_eviction("size");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_weigher_counts_key_and_digits() {
        let key = CacheKey::digest("page", "secret");
        let small = byte_weigher(&key, &Bytes::from_static(b"7"));
        let large = byte_weigher(&key, &Bytes::from_static(b"1234567"));
        assert_eq!(large - small, 6);
        assert!(small as usize > ENTRY_OVERHEAD);
    }
}
