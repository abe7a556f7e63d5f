//! Badge service configuration.
//!
//! Plain serde structures with defaults; durations are written in
//! humantime form (`7d`, `2s`, `500ms`).
//!
//! ```yaml
//! cache:
//!   ttl: 7d
//!   capacity:
//!     max_entries: 100000
//! render:
//!   primary: http://shields.internal:8080
//!   timeout: 3s
//! offload:
//!   max_concurrent_tasks: 256
//!   timeout_policy:
//!     Cancel: 5s
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use visitbadge_moka::{CounterCache, DEFAULT_TIME_TO_LIVE};
use visitbadge_store::CounterStore;

use crate::offload::{OffloadConfig, OffloadManager};

/// Public shields renderer, also the fixed fallback.
pub const DEFAULT_RENDERER: &str = "https://img.shields.io";

/// Default render request timeout.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything [`BadgeService`](crate::BadgeService) needs besides a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Counter cache settings.
    pub cache: CacheConfig,
    /// Renderer settings.
    pub render: RenderConfig,
    /// Background resync executor settings.
    pub offload: OffloadConfig,
}

/// Upper bound on the counter cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    /// At most this many cached counters.
    MaxEntries(u64),
    /// At most roughly this many bytes.
    MaxBytes(u64),
}

impl Default for Capacity {
    fn default() -> Self {
        Self::MaxEntries(100_000)
    }
}

/// Counter cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached counter after its last write.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Capacity ceiling.
    pub capacity: Capacity,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TIME_TO_LIVE,
            capacity: Capacity::default(),
        }
    }
}

impl CacheConfig {
    /// Builds a counter cache over `store` that resyncs through `offload`.
    pub fn build<St>(
        &self,
        store: St,
        offload: OffloadManager,
        store_timeout: Duration,
    ) -> CounterCache<St, OffloadManager>
    where
        St: CounterStore + 'static,
    {
        let builder = CounterCache::builder(store)
            .time_to_live(self.ttl)
            .store_timeout(store_timeout)
            .offload(offload);
        match self.capacity {
            Capacity::MaxEntries(entries) => builder.max_entries(entries).build(),
            Capacity::MaxBytes(bytes) => builder.max_bytes(bytes).build(),
        }
    }
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Preferred shields-compatible endpoint.
    pub primary: String,
    /// Endpoint used after a failure and once the breaker trips.
    pub fallback: String,
    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            primary: DEFAULT_RENDERER.to_owned(),
            fallback: DEFAULT_RENDERER.to_owned(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}
