//! Error types for counter store operations.

use std::time::Duration;

use thiserror::Error;

/// Error type for counter store operations.
///
/// Groups failures so callers can tell an unreachable store (recoverable by
/// a fallback value) from a rejected request.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network interaction error: refused connection, broken pipe, protocol error.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// The store did not answer within the configured bound.
    #[error("counter store did not answer within {0:?}")]
    Timeout(Duration),

    /// `increment_by` was called with a negative delta.
    #[error("negative delta {0} rejected")]
    NegativeDelta(i64),

    /// The stored value is not a non-negative integer.
    #[error("stored value {0:?} is not a counter")]
    InvalidValue(String),

    /// Any other store-side failure.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Whether the error means the store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        let io = std::io::Error::other("refused");
        assert!(StoreError::Connection(Box::new(io)).is_unavailable());
        assert!(StoreError::Timeout(Duration::from_secs(1)).is_unavailable());
        assert!(!StoreError::NegativeDelta(-1).is_unavailable());
        assert!(!StoreError::InvalidValue("x".into()).is_unavailable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::NegativeDelta(-3).to_string(),
            "negative delta -3 rejected"
        );
    }
}
