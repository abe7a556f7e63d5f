//! Offload manager for background task execution.
//!
//! The counter cache hands the store increment behind every cache hit to an
//! offload executor instead of awaiting it on the request path.
//! [`OffloadManager`] is the tracked executor used by the server: it keeps a
//! handle per task so shutdown can drain them within a deadline.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use visitbadge::offload::{OffloadConfig, OffloadManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = OffloadManager::new(OffloadConfig::builder().timeout(Duration::from_secs(5)).build());
//!
//! manager.spawn("resync", async {
//!     // store increment here
//! });
//! assert!(manager.wait_all_timeout(Duration::from_secs(1)).await);
//! # }
//! ```

mod manager;
mod policy;

pub use manager::{OffloadHandle, OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
