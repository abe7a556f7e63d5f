//! Shared handler state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use visitbadge::{BadgeService, CacheKey};
use visitbadge_store::SharedStore;

/// The badge service as wired by the server.
pub type Service = BadgeService<SharedStore>;

/// Cheaply cloneable state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    service: Service,
    secret: Arc<str>,
    store_timeout: Duration,
    request_timeout: Duration,
    stats: Arc<Stats>,
}

impl AppState {
    /// Creates handler state around a service.
    pub fn new(service: Service, secret: impl Into<Arc<str>>) -> Self {
        Self {
            service,
            secret: secret.into(),
            store_timeout: visitbadge_moka::DEFAULT_STORE_TIMEOUT,
            request_timeout: Duration::from_secs(10),
            stats: Arc::new(Stats::new()),
        }
    }

    /// Sets the health probe deadline and the per-badge deadline.
    pub fn with_timeouts(mut self, store: Duration, request: Duration) -> Self {
        self.store_timeout = store;
        self.request_timeout = request;
        self
    }

    /// The badge service.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Hashes a page identifier with the configured secret.
    pub fn key(&self, page_id: &str) -> CacheKey {
        CacheKey::digest(page_id, &self.secret)
    }

    /// Deadline for a store health probe.
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Deadline for serving one badge.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Request statistics.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Badge request counters reported by `/status`.
#[derive(Debug)]
pub struct Stats {
    started: Instant,
    processed: AtomicU64,
    total_micros: AtomicU64,
}

impl Stats {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            processed: AtomicU64::new(0),
            total_micros: AtomicU64::new(0),
        }
    }

    /// Records one served badge.
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Badges served since start.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Mean time to serve a badge, in milliseconds.
    pub fn average_response_ms(&self) -> f64 {
        match self.processed() {
            0 => 0.0,
            n => self.total_micros.load(Ordering::Relaxed) as f64 / n as f64 / 1000.0,
        }
    }

    /// Time since the server started, truncated to whole seconds.
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.started.elapsed().as_secs())
    }
}
