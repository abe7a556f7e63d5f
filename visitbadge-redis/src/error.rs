//! Error types for the Redis counter store.
//!
//! All errors convert into [`StoreError`] so the counter cache handles Redis
//! failures like any other store failure.
//!
//! [`StoreError`]: visitbadge_store::StoreError

use redis::RedisError;
use visitbadge_store::StoreError;

/// Error type for Redis store operations.
///
/// You typically don't handle this error directly. It appears when:
///
/// - Using [`RedisStoreBuilder::build`] with an invalid connection URL
/// - Performing the first operation when Redis is unreachable
///   (connection is established lazily)
/// - Redis holds something other than an integer under a counter key
///
/// [`RedisStoreBuilder::build`]: crate::RedisStoreBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis store error: {0}")]
    Redis(#[from] RedisError),

    /// A counter key holds a value that is not a non-negative integer.
    #[error("Redis key holds non-counter value {0:?}")]
    NotACounter(String),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Redis(err) => {
                let unreachable = err.is_io_error()
                    || err.is_timeout()
                    || err.is_connection_dropped()
                    || err.is_connection_refusal();
                classify(unreachable, err)
            }
            Error::NotACounter(value) => Self::InvalidValue(value),
        }
    }
}

/// Only transport failures mean the store is unavailable; server replies
/// such as `WRONGTYPE` are internal errors.
fn classify(unreachable: bool, err: RedisError) -> StoreError {
    if unreachable {
        StoreError::Connection(Box::new(err))
    } else {
        StoreError::Internal(Box::new(err))
    }
}
