//! OffloadManager implementation for background task execution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};
use crate::metrics;

/// Key identifying one offloaded task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadKey {
    /// Kind of the task (e.g. `"resync"`).
    pub kind: SmolStr,
    /// Unique identifier within the manager.
    pub id: u64,
}

impl fmt::Display for OffloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Handle to a spawned offload task.
#[derive(Debug)]
pub struct OffloadHandle {
    handle: JoinHandle<()>,
}

impl OffloadHandle {
    /// Check if the task is finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<OffloadKey, OffloadHandle>,
    key_counter: AtomicU64,
    permits: Option<Arc<Semaphore>>,
}

/// Manager for offloading tasks to background execution.
///
/// Every spawned task is tracked until it finishes, so the owner can drain
/// them with [`wait_all_timeout`](Self::wait_all_timeout) at shutdown and
/// abort whatever is left.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager with the given configuration.
    pub fn new(config: OffloadConfig) -> Self {
        let permits = config
            .max_concurrent_tasks
            .map(|max| Arc::new(Semaphore::new(max)));
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
                permits,
            }),
        }
    }

    /// Create a new OffloadManager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> OffloadKey {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        OffloadKey {
            kind: kind.into(),
            id,
        }
    }

    /// Spawn a task of the given kind.
    ///
    /// The kind is used for metrics labels and tracing.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);
        metrics::record_offload_spawned(&key.kind);
        let (registered, handle) = self.spawn_inner(task, key.clone());
        self.inner.tasks.insert(key.clone(), handle);
        // The task removes its own entry, so it may only finish after the insert.
        let _ = registered.send(());
        key
    }

    /// Get the number of currently active tasks.
    pub fn active_task_count(&self) -> usize {
        self.inner.tasks.iter().filter(|e| !e.is_finished()).count()
    }

    /// Get the total number of tracked tasks (including finished).
    pub fn total_task_count(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Clean up finished task handles.
    pub fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Cancel all running tasks.
    pub fn cancel_all(&self) {
        for entry in self.inner.tasks.iter() {
            entry.abort();
        }
    }

    /// Check if a task with the given key is in flight.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.inner.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    /// Wait for all currently tracked tasks to complete.
    ///
    /// Tasks spawned while waiting are waited for as well.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Wait for all tasks with a timeout.
    ///
    /// Returns `true` if all tasks completed within the timeout,
    /// `false` if the timeout was reached.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    /// Drains tasks for at most `timeout`, then aborts the rest.
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        if self.wait_all_timeout(timeout).await {
            debug!("All offloaded tasks drained");
            return 0;
        }
        self.cleanup_finished();
        let abandoned = self.inner.tasks.len();
        warn!(abandoned, ?timeout, "Aborting offloaded tasks still running at shutdown");
        self.cancel_all();
        abandoned
    }

    fn spawn_inner<F>(&self, task: F, key: OffloadKey) -> (oneshot::Sender<()>, OffloadHandle)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timeout_policy = self.inner.config.timeout_policy.clone();
        let permits = self.inner.permits.clone();
        let inner = self.inner.clone();

        let span = info_span!("offload_task", kind = %key.kind, id = key.id);
        let (registered, tracked) = oneshot::channel::<()>();

        let handle = tokio::spawn(
            async move {
                let _ = tracked.await;
                // Held for the whole task.
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };
                let start = Instant::now();
                match timeout_policy {
                    TimeoutPolicy::None => {
                        task.await;
                        metrics::record_offload_completed(&key.kind, start.elapsed());
                    }
                    TimeoutPolicy::Cancel(duration) => {
                        match tokio::time::timeout(duration, task).await {
                            Ok(()) => metrics::record_offload_completed(&key.kind, start.elapsed()),
                            Err(_) => {
                                warn!(%key, "Offload task cancelled due to timeout");
                                metrics::record_offload_timeout(&key.kind, start.elapsed());
                            }
                        }
                    }
                    TimeoutPolicy::Warn(duration) => {
                        task.await;
                        let elapsed = start.elapsed();
                        if elapsed > duration {
                            warn!(
                                %key,
                                elapsed_ms = elapsed.as_millis(),
                                threshold_ms = duration.as_millis(),
                                "Offload task exceeded timeout threshold"
                            );
                        }
                        metrics::record_offload_completed(&key.kind, elapsed);
                    }
                }
                inner.tasks.remove(&key);
            }
            .instrument(span),
        );

        (registered, OffloadHandle { handle })
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl visitbadge_core::Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}
