#![warn(missing_docs)]
//! Redis implementation of the visitbadge [`CounterStore`].
//!
//! Counts live under the hashed page key as plain Redis integers, so the
//! store stays readable with `redis-cli` (`GET <key>`). Atomicity across
//! instances comes from Redis itself (`INCR`, `INCRBY`).
//!
//! [`CounterStore`]: visitbadge_store::CounterStore

pub mod error;
pub mod store;

#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::store::{RedisStore, RedisStoreBuilder};
