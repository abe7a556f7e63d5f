//! In-memory counter cache for visitbadge, built on [Moka](https://docs.rs/moka).
//!
//! [`CounterCache`] sits in front of a durable
//! [`CounterStore`](visitbadge_store::CounterStore) and turns most view
//! counts into a local digit tally plus a background store increment.
//!
//! ```
//! use visitbadge_core::CacheKey;
//! use visitbadge_moka::CounterCache;
//! use visitbadge_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = CounterCache::builder(MemoryStore::new())
//!     .max_entries(1_000)
//!     .build();
//! let count = cache.bump(&CacheKey::digest("home", "s3cr3t")).await.unwrap();
//! assert_eq!(count.as_str(), "1");
//! # }
//! ```
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod cache;
mod error;
pub mod metrics;

pub use builder::{
    ByteCapacity, CounterCacheBuilder, DEFAULT_STORE_TIMEOUT, DEFAULT_TIME_TO_LIVE, EntryCapacity,
    NoCapacity,
};
pub use cache::CounterCache;
pub use error::CacheError;
pub use moka::policy::EvictionPolicy;
