//! HTTP front end for [`visitbadge`].
//!
//! Serves `GET /badge?page_id=...` plus the operational endpoints `/ping`,
//! `/status`, `/health` and, in maintenance mode, `/rec` for restoring lost
//! counts. Configuration comes from YAML with environment overrides, see
//! [`config`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ConfigError, ServerError};
pub use routes::router;
pub use state::{AppState, Service};

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when `debug` is on.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt().with_env_filter(filter).init();
}
