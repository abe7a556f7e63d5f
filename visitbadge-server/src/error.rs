//! Error types for the server binary.

use std::path::PathBuf;

use thiserror::Error;
use visitbadge::render::RenderError;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML is malformed or does not match the schema.
    #[error("invalid config: {0}")]
    Parse(String),

    /// An environment override has an unusable value.
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Fatal server start-up or run failure.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The Redis URL is invalid.
    #[error(transparent)]
    Redis(#[from] visitbadge_redis::Error),

    /// The render endpoints are invalid.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server task panicked.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
