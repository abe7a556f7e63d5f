use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, error, warn};
use visitbadge_core::BadgeOptions;

use super::breaker::{CircuitBreaker, Route};
use super::error::RenderError;
use crate::config::RenderConfig;
use crate::metrics;

const SVG: HeaderValue = HeaderValue::from_static("image/svg+xml");

/// Badge renderer client with fallback and circuit breaker.
///
/// Cloning is cheap; clones share the HTTP connection pool and the breaker.
#[derive(Clone, Debug)]
pub struct RenderClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    primary: Url,
    fallback: Url,
    breaker: Arc<CircuitBreaker>,
}

impl RenderClient {
    /// Creates a client from configuration with a fresh breaker.
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        Self::with_breaker(config, Arc::new(CircuitBreaker::new()))
    }

    /// Creates a client sharing `breaker`.
    pub fn with_breaker(
        config: &RenderConfig,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, RenderError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                primary: parse_endpoint(&config.primary)?,
                fallback: parse_endpoint(&config.fallback)?,
                breaker,
            }),
        })
    }

    /// The breaker guarding the primary endpoint.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.inner.breaker
    }

    /// Renders `options`, always producing a body.
    ///
    /// The first attempt goes to the endpoint the breaker selects; a failure
    /// is counted and retried once against the fallback. When both attempts
    /// fail the result is an empty placeholder.
    pub async fn render(&self, options: &BadgeOptions) -> Bytes {
        let inner = &self.inner;
        let route = inner.breaker.select();
        let first = match route {
            Route::Primary => &inner.primary,
            Route::Fallback => &inner.fallback,
        };

        let error = match self.try_render(first, options).await {
            Ok(body) => {
                debug!(endpoint = %first, text = %options.text, bytes = body.len(), "Badge rendered");
                metrics::record_render("rendered");
                return body;
            }
            Err(error) => error,
        };

        let errors = inner.breaker.record_failure();
        warn!(endpoint = %first, %error, errors, band = %inner.breaker.band(), "Badge render failed, retrying on fallback");

        match self.try_render(&inner.fallback, options).await {
            Ok(body) => {
                debug!(endpoint = %inner.fallback, text = %options.text, bytes = body.len(), "Badge rendered by fallback");
                metrics::record_render("fallback");
                body
            }
            Err(error) => {
                let errors = inner.breaker.record_failure();
                error!(endpoint = %inner.fallback, %error, errors, "Fallback render failed, emitting placeholder badge");
                metrics::record_render("placeholder");
                Bytes::new()
            }
        }
    }

    /// Performs one render request against `endpoint`.
    pub async fn try_render(
        &self,
        endpoint: &Url,
        options: &BadgeOptions,
    ) -> Result<Bytes, RenderError> {
        let url = badge_url(endpoint, options)?;
        let start = Instant::now();
        let response = self
            .inner
            .http
            .get(url)
            .header(ACCEPT, SVG)
            .send()
            .await?;

        let status = response.status();
        metrics::record_render_duration(endpoint.as_str(), start.elapsed());
        if status != StatusCode::OK {
            return Err(RenderError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }
        Ok(response.bytes().await?)
    }

    /// The configured primary endpoint.
    pub fn primary(&self) -> &Url {
        &self.inner.primary
    }

    /// The fixed fallback endpoint.
    pub fn fallback(&self) -> &Url {
        &self.inner.fallback
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, RenderError> {
    let url = Url::parse(raw).map_err(|_| RenderError::Url(raw.to_owned()))?;
    if url.cannot_be_a_base() {
        return Err(RenderError::Url(raw.to_owned()));
    }
    Ok(url)
}

/// Builds `{endpoint}/badge/{label}-{text}-{colour}?labelColor=..&style=..&logo=..&logoColor=..`.
pub(crate) fn badge_url(endpoint: &Url, options: &BadgeOptions) -> Result<Url, RenderError> {
    let mut url = endpoint.clone();
    let segment = format!(
        "{}-{}-{}",
        escape(&options.label),
        escape(&options.text),
        escape(&options.colour)
    );
    url.path_segments_mut()
        .map_err(|()| RenderError::Url(endpoint.to_string()))?
        .pop_if_empty()
        .push("badge")
        .push(&segment);
    url.query_pairs_mut()
        .clear()
        .append_pair("labelColor", &options.label_colour)
        .append_pair("style", &options.style)
        .append_pair("logo", &options.logo)
        .append_pair("logoColor", &options.logo_colour);
    Ok(url)
}

/// Shields static badge escaping: dashes and underscores are doubled.
fn escape(part: &str) -> String {
    part.replace('-', "--").replace('_', "__")
}
