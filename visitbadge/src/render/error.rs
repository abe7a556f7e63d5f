use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single render attempt.
///
/// Never leaves [`RenderClient::render`](super::RenderClient::render), which
/// recovers every error into a fallback attempt or an empty placeholder.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Connection, TLS, timeout or body read failure.
    #[error("render request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The renderer answered with something other than `200 OK`.
    #[error("renderer {endpoint} answered {status}")]
    Status {
        /// Endpoint that was called.
        endpoint: String,
        /// Status it answered with.
        status: StatusCode,
    },

    /// The endpoint cannot carry a badge path.
    #[error("invalid render endpoint {0:?}")]
    Url(String),
}
