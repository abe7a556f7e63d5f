//! Error types for counter cache operations.

use thiserror::Error;
use visitbadge_core::MalformedCounter;
use visitbadge_store::StoreError;

/// Error type for [`CounterCache`](crate::CounterCache) operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The durable store could not be reached (connection failure or timeout).
    ///
    /// Callers are expected to fall back to a sentinel count.
    #[error("counter store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// The store answered but refused the request or returned garbage.
    #[error(transparent)]
    Rejected(StoreError),

    /// A counter value is not a decimal digit sequence.
    #[error(transparent)]
    Malformed(#[from] MalformedCounter),
}

impl From<StoreError> for CacheError {
    fn from(error: StoreError) -> Self {
        if error.is_unavailable() {
            Self::StoreUnavailable(error)
        } else {
            Self::Rejected(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_store_error_classification() {
        let err = CacheError::from(StoreError::Timeout(Duration::from_secs(1)));
        assert!(matches!(err, CacheError::StoreUnavailable(_)));

        let err = CacheError::from(StoreError::NegativeDelta(-1));
        assert!(matches!(err, CacheError::Rejected(StoreError::NegativeDelta(-1))));
    }
}
