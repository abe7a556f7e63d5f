#![warn(missing_docs)]
//! Durable counter store contract for visitbadge.
//!
//! The store is the source of truth for view counts. The in-process counter
//! cache only ever talks to it through [`CounterStore`], so any atomic
//! key-count service can be plugged in. This crate ships the contract, its
//! error type and an in-memory implementation; `visitbadge-redis` provides the
//! production one.
mod error;
mod memory;
pub mod metrics;
mod store;

pub use error::StoreError;
pub use memory::{MemoryStore, StoreCounters};
pub use store::{CounterStore, SharedStore, StoreResult, bounded};
