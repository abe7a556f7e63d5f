//! Capacity and expiry of cached counters.

use std::time::Duration;

use visitbadge_core::CacheKey;
use visitbadge_moka::CounterCache;
use visitbadge_store::MemoryStore;

fn key(id: u32) -> CacheKey {
    CacheKey::digest(&format!("page-{id}"), "eviction")
}

#[tokio::test]
async fn test_max_entries_evicts_least_recently_counted() {
    let cache = CounterCache::builder(MemoryStore::new())
        .max_entries(3)
        .build();

    for id in 1..=3 {
        cache.bump(&key(id)).await.unwrap();
        cache.run_pending_tasks().await;
    }
    assert_eq!(cache.entry_count(), 3);

    cache.bump(&key(4)).await.unwrap();
    cache.run_pending_tasks().await;

    assert_eq!(cache.entry_count(), 3);
    assert!(cache.cached(&key(4)).await.is_some());
    assert!(
        cache.cached(&key(1)).await.is_none(),
        "oldest counter should be evicted first"
    );
}

#[tokio::test]
async fn test_max_bytes_bounds_weighted_size() {
    let budget = 1_000;
    let cache = CounterCache::builder(MemoryStore::new())
        .max_bytes(budget)
        .build();

    for id in 0..20 {
        cache.bump(&key(id)).await.unwrap();
    }
    cache.run_pending_tasks().await;

    assert!(cache.entry_count() > 0);
    assert!(cache.entry_count() < 20);
    assert!(cache.entries().weighted_size() <= budget);
}

#[tokio::test]
async fn test_expired_counter_reloads_from_store() {
    let store = MemoryStore::new();
    let cache = CounterCache::builder(store.clone())
        .max_entries(10)
        .time_to_live(Duration::from_millis(50))
        .build();
    let k = key(7);

    assert_eq!(cache.bump(&k).await.unwrap().as_str(), "1");
    tokio::time::sleep(Duration::from_millis(150)).await;
    cache.run_pending_tasks().await;
    assert!(cache.cached(&k).await.is_none());

    store.seed(&k, 30);
    assert_eq!(cache.bump(&k).await.unwrap().as_str(), "31");
    assert_eq!(store.counters().increment_count(), 2);
}
