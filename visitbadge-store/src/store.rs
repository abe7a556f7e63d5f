use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::trace;
use visitbadge_core::CacheKey;

use crate::{StoreError, metrics};

pub type StoreResult<T> = Result<T, StoreError>;

/// Contract for the durable counter store.
///
/// Every operation must be atomic with respect to concurrent callers across
/// the whole fleet: two processes incrementing the same key never observe the
/// same returned value.
#[async_trait]
pub trait CounterStore: Sync + Send {
    /// Atomically increments `key` by one and returns the new value.
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64>;

    /// Returns the current value of `key`, `0` if it was never incremented.
    ///
    /// Must not create the key.
    async fn get(&self, key: &CacheKey) -> StoreResult<u64>;

    /// Atomically adds `delta` to `key` and returns the new value.
    async fn add(&self, key: &CacheKey, delta: u64) -> StoreResult<u64>;

    /// Adds a signed `delta`, rejecting negative values.
    ///
    /// A negative delta fails with [`StoreError::NegativeDelta`] and leaves the
    /// stored value untouched.
    async fn increment_by(&self, key: &CacheKey, delta: i64) -> StoreResult<u64> {
        let delta = u64::try_from(delta).map_err(|_| StoreError::NegativeDelta(delta))?;
        self.add(key, delta).await
    }

    /// Cheap liveness probe used by health endpoints.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Returns the name of this store for logs and metrics.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl<T> CounterStore for Arc<T>
where
    T: CounterStore + ?Sized,
{
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64> {
        (**self).increment(key).await
    }

    async fn get(&self, key: &CacheKey) -> StoreResult<u64> {
        (**self).get(key).await
    }

    async fn add(&self, key: &CacheKey, delta: u64) -> StoreResult<u64> {
        (**self).add(key, delta).await
    }

    async fn increment_by(&self, key: &CacheKey, delta: i64) -> StoreResult<u64> {
        (**self).increment_by(key, delta).await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T> CounterStore for Box<T>
where
    T: CounterStore + ?Sized,
{
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64> {
        (**self).increment(key).await
    }

    async fn get(&self, key: &CacheKey) -> StoreResult<u64> {
        (**self).get(key).await
    }

    async fn add(&self, key: &CacheKey, delta: u64) -> StoreResult<u64> {
        (**self).add(key, delta).await
    }

    async fn increment_by(&self, key: &CacheKey, delta: i64) -> StoreResult<u64> {
        (**self).increment_by(key, delta).await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Shared handle to a type-erased store.
pub type SharedStore = Arc<dyn CounterStore>;

/// Runs one store operation under a deadline and records its metrics.
///
/// A missed deadline becomes [`StoreError::Timeout`], so a stalled store
/// surfaces as unavailable instead of hanging the caller.
pub async fn bounded<T, F>(store: &str, op: &'static str, timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    let timer = metrics::Timer::new();
    let result = match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    };
    trace!(store, op, ok = result.is_ok(), "store operation finished");
    metrics::record_operation(store, op, timer.elapsed(), result.is_ok());
    result
}
