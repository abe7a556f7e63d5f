//! Offload trait for background task execution.
//!
//! The counter cache hands its store resyncs to an [`Offload`] implementation
//! instead of awaiting them on the request path. The primary implementation is
//! `OffloadManager` in the `visitbadge` crate, which tracks spawned tasks so
//! they can be drained on shutdown.

use std::future::Future;

use smol_str::SmolStr;

/// Trait for spawning background tasks.
///
/// Implementors should use `Arc` internally so all clones share the same
/// task registry.
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// * `kind` - label categorizing the task (e.g. `"resync"`), used for
    ///   tracing and metrics.
    /// * `future` - the work itself; it must not borrow from the caller.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Offload that runs tasks on the ambient tokio runtime without tracking them.
///
/// Tasks spawned here cannot be drained on shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedOffload;

impl Offload for DetachedOffload {
    fn spawn<F>(&self, _kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }
}
