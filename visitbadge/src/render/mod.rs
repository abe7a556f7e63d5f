//! Badge rendering through a shields-compatible HTTP endpoint.
//!
//! [`RenderClient`] asks the configured renderer for an SVG, falls back to the
//! public renderer on failure, and abandons the primary for good once the
//! shared [`CircuitBreaker`] leaves [`Band::Closed`].

mod breaker;
mod client;
mod error;

pub use breaker::{Band, CircuitBreaker, DEGRADED_AT, Route, SATURATED_AT};
pub use client::RenderClient;
pub use error::RenderError;
