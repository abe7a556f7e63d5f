//! Error-count circuit breaker for the render client.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Error count at which the breaker leaves [`Band::Closed`].
pub const DEGRADED_AT: u64 = 6;

/// Error count at which the breaker enters [`Band::Saturated`].
pub const SATURATED_AT: u64 = 10;

/// Range of the render error counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// `0..=5` errors: the configured primary endpoint is used.
    Closed,
    /// `6..=9` errors: the fallback endpoint replaces the primary.
    Degraded,
    /// `10..` errors: no further state change, behaves like `Degraded`.
    Saturated,
}

impl Band {
    /// Classifies an error count.
    pub fn of(errors: u64) -> Self {
        match errors {
            0..DEGRADED_AT => Self::Closed,
            DEGRADED_AT..SATURATED_AT => Self::Degraded,
            _ => Self::Saturated,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Degraded => "degraded",
            Self::Saturated => "saturated",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint chosen for a render attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The configured primary renderer.
    Primary,
    /// The fixed public fallback renderer.
    Fallback,
}

/// Process-wide render error counter with a one-way trip.
///
/// The counter only grows. Once a selection observes a count outside
/// [`Band::Closed`], the breaker trips and every later selection routes to
/// the fallback, even if the count were somehow lower. There is no reset.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    errors: AtomicU64,
    tripped: AtomicBool,
}

impl CircuitBreaker {
    /// Creates a closed breaker with no recorded errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a breaker whose counter already holds `errors`.
    pub fn starting_at(errors: u64) -> Self {
        Self {
            errors: AtomicU64::new(errors),
            tripped: AtomicBool::new(false),
        }
    }

    /// Current error count.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Acquire)
    }

    /// Band of the current error count.
    pub fn band(&self) -> Band {
        Band::of(self.errors())
    }

    /// Whether the primary endpoint has been abandoned.
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Picks the endpoint for the first attempt of a render.
    pub fn select(&self) -> Route {
        if self.is_tripped() {
            return Route::Fallback;
        }
        match self.band() {
            Band::Closed => Route::Primary,
            Band::Degraded | Band::Saturated => {
                self.tripped.store(true, Ordering::Release);
                Route::Fallback
            }
        }
    }

    /// Counts one failed attempt and returns the new total.
    pub fn record_failure(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(Band::of(0), Band::Closed);
        assert_eq!(Band::of(5), Band::Closed);
        assert_eq!(Band::of(6), Band::Degraded);
        assert_eq!(Band::of(9), Band::Degraded);
        assert_eq!(Band::of(10), Band::Saturated);
        assert_eq!(Band::of(u64::MAX), Band::Saturated);
    }

    #[test]
    fn test_closed_breaker_routes_to_primary() {
        let breaker = CircuitBreaker::starting_at(5);
        assert_eq!(breaker.select(), Route::Primary);
        assert!(!breaker.is_tripped());
    }

    #[test]
    fn test_degraded_breaker_trips_for_good() {
        let breaker = CircuitBreaker::starting_at(5);
        assert_eq!(breaker.record_failure(), 6);
        assert_eq!(breaker.select(), Route::Fallback);
        assert!(breaker.is_tripped());
        assert_eq!(breaker.select(), Route::Fallback);
    }

    #[test]
    fn test_saturated_behaves_like_degraded() {
        let breaker = CircuitBreaker::starting_at(12);
        assert_eq!(breaker.band(), Band::Saturated);
        assert_eq!(breaker.select(), Route::Fallback);
        assert!(breaker.is_tripped());
    }
}
