//! Contract tests for the in-memory counter store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use visitbadge_core::CacheKey;
use visitbadge_store::{CounterStore, MemoryStore, SharedStore, StoreError, StoreResult, bounded};

fn key(name: &str) -> CacheKey {
    CacheKey::digest(name, "test-secret")
}

#[tokio::test]
async fn test_get_unknown_key_returns_zero_without_creating_it() {
    let store = MemoryStore::new();
    let k = key("unknown");

    assert_eq!(store.get(&k).await.unwrap(), 0);
    assert!(!store.contains(&k));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_increment_is_sequential() {
    let store = MemoryStore::new();
    let k = key("page");

    for expected in 1..=5 {
        assert_eq!(store.increment(&k).await.unwrap(), expected);
    }
    assert_eq!(store.get(&k).await.unwrap(), 5);
    assert_eq!(store.counters().increment_count(), 5);
}

#[tokio::test]
async fn test_increment_by_negative_delta_is_rejected() {
    let store = MemoryStore::new();
    let k = key("page");
    store.seed(&k, 10);

    let result = store.increment_by(&k, -1).await;
    assert!(matches!(result, Err(StoreError::NegativeDelta(-1))));
    assert_eq!(store.get(&k).await.unwrap(), 10);
    assert_eq!(store.counters().add_count(), 0);
}

#[tokio::test]
async fn test_increment_by_positive_delta() {
    let store = MemoryStore::new();
    let k = key("page");

    assert_eq!(store.increment_by(&k, 40).await.unwrap(), 40);
    assert_eq!(store.increment_by(&k, 0).await.unwrap(), 40);
    assert_eq!(store.increment(&k).await.unwrap(), 41);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_atomic() {
    let store = MemoryStore::new();
    let k = key("hot");

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let store = store.clone();
            let k = k.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    store.increment(&k).await.unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.get(&k).await.unwrap(), 64 * 50);
}

#[tokio::test]
async fn test_shared_store_delegates() {
    let memory = MemoryStore::new();
    let shared: SharedStore = Arc::new(memory.clone());
    let k = key("page");

    assert_eq!(shared.increment(&k).await.unwrap(), 1);
    assert!(shared.increment_by(&k, -5).await.is_err());
    assert_eq!(shared.name(), "memory");
    assert!(shared.ping().await.is_ok());
    assert_eq!(memory.get(&k).await.unwrap(), 1);
}

struct StalledStore;

#[async_trait]
impl CounterStore for StalledStore {
    async fn increment(&self, _key: &CacheKey) -> StoreResult<u64> {
        std::future::pending().await
    }

    async fn get(&self, _key: &CacheKey) -> StoreResult<u64> {
        std::future::pending().await
    }

    async fn add(&self, _key: &CacheKey, _delta: u64) -> StoreResult<u64> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_bounded_turns_stall_into_timeout() {
    let store = StalledStore;
    let k = key("page");

    let result = bounded(store.name(), "increment", Duration::from_millis(200), store.increment(&k)).await;
    match result {
        Err(err @ StoreError::Timeout(_)) => assert!(err.is_unavailable()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
