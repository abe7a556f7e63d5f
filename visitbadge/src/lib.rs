#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # visitbadge
//!
//! Visit counter badges: count a page view, render it as an SVG badge.
//!
//! [`BadgeService`] ties together
//!
//! - the [`CounterCache`](visitbadge_moka::CounterCache), which tallies hits
//!   locally and resyncs them into a durable
//!   [`CounterStore`](visitbadge_store::CounterStore) in the background,
//! - the [`RenderClient`](render::RenderClient), which asks a
//!   shields-compatible renderer for the image and falls back to the public
//!   renderer when the configured one misbehaves,
//! - the [`OffloadManager`](offload::OffloadManager) running the resyncs.
//!
//! ```no_run
//! use std::time::Duration;
//! use visitbadge::{BadgeRequest, BadgeService, ServiceConfig};
//! use visitbadge_core::CacheKey;
//! use visitbadge_store::MemoryStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = BadgeService::from_config(
//!     MemoryStore::new(),
//!     Duration::from_secs(2),
//!     &ServiceConfig::default(),
//! )?;
//! let badge = service
//!     .badge(BadgeRequest::new(CacheKey::digest("my-page", "secret")))
//!     .await;
//! println!("{} bytes", badge.body.len());
//! service.shutdown(Duration::from_secs(15)).await;
//! # Ok(())
//! # }
//! ```

/// Service configuration types.
pub mod config;

/// Metrics collection for badge serving.
///
/// When the `metrics` feature is enabled, this module records badge
/// outcomes, render outcomes and latencies, and offload task lifecycles.
pub mod metrics;

/// Background task offloading for store resyncs.
pub mod offload;

/// Shields renderer client with fallback and circuit breaker.
pub mod render;

/// Count-then-render orchestration.
pub mod service;

pub use config::{CacheConfig, Capacity, RenderConfig, ServiceConfig};
pub use service::{Badge, BadgeRequest, BadgeService};

pub use visitbadge_core::{BadgeOptions, CacheKey, Digits};
pub use visitbadge_moka::CacheError;
