//! Badge service: count, then render.

use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, DATE, EXPIRES, HeaderMap, HeaderValue};
use tracing::{error, info};
use visitbadge_core::{BadgeOptions, CacheKey, Digits};
use visitbadge_moka::{CacheError, CounterCache};
use visitbadge_store::CounterStore;

use crate::config::ServiceConfig;
use crate::metrics;
use crate::offload::OffloadManager;
use crate::render::{RenderClient, RenderError};

/// Text rendered when the count could not be obtained.
pub const ERROR_TEXT: &str = "error";

/// Placeholder in a custom template replaced by the count.
pub const COUNT_PLACEHOLDER: &str = "CNT";

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// One badge to serve.
#[derive(Debug, Clone)]
pub struct BadgeRequest {
    /// Hashed page identifier.
    pub key: CacheKey,
    /// Rendering options; `options.hit` selects counting vs. reading.
    pub options: BadgeOptions,
    /// Template whose first `CNT` is replaced by the count.
    pub custom: Option<String>,
    /// Whether clients may cache the badge for ten minutes.
    pub cacheable: bool,
}

impl BadgeRequest {
    /// A counting, non-cacheable request with default options.
    pub fn new(key: CacheKey) -> Self {
        Self {
            key,
            options: BadgeOptions::default(),
            custom: None,
            cacheable: false,
        }
    }
}

/// A served badge: SVG body plus response headers.
#[derive(Debug, Clone)]
pub struct Badge {
    /// Renderer output, empty when rendering failed.
    pub body: Bytes,
    /// `Content-Type`, `Cache-Control`, `Date` and `Expires`.
    pub headers: HeaderMap,
    /// Text that was rendered.
    pub text: String,
}

/// Builds the response headers of a badge served at `now`.
///
/// `Date` is always backdated by ten minutes. Non-cacheable badges also
/// expire at that instant; cacheable ones expire ten minutes from now.
pub fn badge_headers(now: DateTime<Utc>, cacheable: bool) -> HeaderMap {
    let window = TimeDelta::minutes(10);
    let date = http_date(now - window);
    let (expires, cache_control) = if cacheable {
        (http_date(now + window), "max-age=600")
    } else {
        (date.clone(), "no-cache,max-age=0")
    };

    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers.insert(DATE, date);
    headers.insert(EXPIRES, expires);
    headers
}

fn http_date(at: DateTime<Utc>) -> HeaderValue {
    let formatted = at.format(HTTP_DATE).to_string();
    // RFC 7231 dates are plain ASCII.
    HeaderValue::from_str(&formatted).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Applies a custom template: the first `CNT` becomes `count`.
pub fn apply_template(template: &str, count: &str) -> String {
    template.replacen(COUNT_PLACEHOLDER, count, 1)
}

/// Orchestrates the counter cache and the renderer.
pub struct BadgeService<St>
where
    St: CounterStore + 'static,
{
    cache: CounterCache<St, OffloadManager>,
    render: RenderClient,
    offload: OffloadManager,
}

impl<St> Clone for BadgeService<St>
where
    St: CounterStore + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            render: self.render.clone(),
            offload: self.offload.clone(),
        }
    }
}

impl<St> std::fmt::Debug for BadgeService<St>
where
    St: CounterStore + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeService")
            .field("cache", &self.cache)
            .field("render", &self.render)
            .field("offload", &self.offload)
            .finish()
    }
}

impl<St> BadgeService<St>
where
    St: CounterStore + 'static,
{
    /// Wires already-built parts together.
    ///
    /// `offload` should be the executor `cache` was built with, so that
    /// [`shutdown`](Self::shutdown) drains its resyncs.
    pub fn new(
        cache: CounterCache<St, OffloadManager>,
        render: RenderClient,
        offload: OffloadManager,
    ) -> Self {
        Self {
            cache,
            render,
            offload,
        }
    }

    /// Builds every part from configuration.
    pub fn from_config(
        store: St,
        store_timeout: Duration,
        config: &ServiceConfig,
    ) -> Result<Self, RenderError> {
        let offload = OffloadManager::new(config.offload.clone());
        let cache = config.cache.build(store, offload.clone(), store_timeout);
        let render = RenderClient::new(&config.render)?;
        Ok(Self::new(cache, render, offload))
    }

    /// Counts (or reads) and renders one badge.
    ///
    /// Never fails: a counting failure renders [`ERROR_TEXT`] and a render
    /// failure yields an empty body.
    pub async fn badge(&self, request: BadgeRequest) -> Badge {
        let start = Instant::now();
        let BadgeRequest {
            key,
            options,
            custom,
            cacheable,
        } = request;

        let (count, outcome) = match self.count(&key, options.hit).await {
            Ok(count) => (
                count.to_string(),
                if options.hit { "counted" } else { "peeked" },
            ),
            Err(error) => {
                error!(%key, %error, hit = options.hit, "Counting failed, rendering error badge");
                (ERROR_TEXT.to_owned(), "error")
            }
        };

        let text = match custom.as_deref() {
            Some(template) => apply_template(template, &count),
            None => count,
        };

        let body = self.render.render(&options.with_text(text.as_str())).await;
        info!(%key, views = %text, bytes = body.len(), "Generated badge");
        metrics::record_badge(outcome, start.elapsed());

        Badge {
            body,
            headers: badge_headers(Utc::now(), cacheable),
            text,
        }
    }

    /// Bumps the count of `key` when `hit`, otherwise reads it.
    pub async fn count(&self, key: &CacheKey, hit: bool) -> Result<Digits, CacheError> {
        if hit {
            self.cache.bump(key).await
        } else {
            self.cache.peek(key).await
        }
    }

    /// Adds `delta` views to `key`; negative deltas are rejected.
    pub async fn recover(&self, key: &CacheKey, delta: i64) -> Result<Digits, CacheError> {
        let count = self.cache.recover(key, delta).await?;
        info!(%key, delta, views = %count, "Recovered badge");
        Ok(count)
    }

    /// Drains pending resyncs for at most `timeout`.
    ///
    /// Returns the number of resyncs abandoned.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        self.offload.shutdown(timeout).await
    }

    /// The counter cache.
    pub fn cache(&self) -> &CounterCache<St, OffloadManager> {
        &self.cache
    }

    /// The render client.
    pub fn render(&self) -> &RenderClient {
        &self.render
    }

    /// The resync executor.
    pub fn offload(&self) -> &OffloadManager {
        &self.offload
    }
}
