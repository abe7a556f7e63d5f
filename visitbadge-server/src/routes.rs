//! HTTP routes.

use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use visitbadge::{BadgeOptions, BadgeRequest, CacheError};
use visitbadge_store::{CounterStore, StoreResult, bounded};

use crate::state::AppState;

/// Where `/` redirects to.
pub const REPOSITORY: &str = "https://github.com/Nathan13888/VisitorBadgeReloaded";

/// `/ping` body.
pub const PONG: &str = "PONG!!! Refer to /status for more in-depth information.";

/// Builds the application router. `/rec` is only mounted in maintenance mode.
pub fn router(state: AppState, maintenance: bool) -> Router {
    let mut router = Router::new()
        .route("/badge", get(badge))
        .route("/ping", get(ping))
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/", get(index))
        .route("/index.html", get(index));
    if maintenance {
        router = router.route("/rec", get(recover));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// `/badge` query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BadgeQuery {
    page_id: Option<String>,
    color: Option<String>,
    lcolor: Option<String>,
    style: Option<String>,
    text: Option<String>,
    logo: Option<String>,
    #[serde(rename = "logoColor")]
    logo_color: Option<String>,
    hit: Option<String>,
    custom: Option<String>,
    unique: Option<String>,
}

impl BadgeQuery {
    fn options(&self) -> BadgeOptions {
        let defaults = BadgeOptions::default();
        BadgeOptions {
            label: or(&self.text, defaults.label),
            text: String::new(),
            colour: or(&self.color, defaults.colour),
            label_colour: or(&self.lcolor, defaults.label_colour),
            style: or(&self.style, defaults.style),
            logo: or(&self.logo, defaults.logo),
            logo_colour: or(&self.logo_color, defaults.logo_colour),
            hit: counts_hit(self.hit.as_deref()),
        }
    }
}

fn or(value: &Option<String>, default: String) -> String {
    match value.as_deref() {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => default,
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Absent or empty counts; otherwise only `true` and `yes` do.
pub fn counts_hit(hit: Option<&str>) -> bool {
    match hit {
        None | Some("") => true,
        Some(value) => value == "true" || value == "yes",
    }
}

async fn badge(State(state): State<AppState>, Query(query): Query<BadgeQuery>) -> Response {
    let start = Instant::now();
    let options = query.options();
    let Some(page_id) = present(query.page_id) else {
        debug!("Badge requested without page_id");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let request = BadgeRequest {
        key: state.key(&page_id),
        options,
        custom: present(query.custom),
        cacheable: present(query.unique).is_some(),
    };

    let served = tokio::time::timeout(state.request_timeout(), state.service().badge(request));
    let response = match served.await {
        Ok(badge) => (StatusCode::OK, badge.headers, badge.body).into_response(),
        Err(_) => {
            warn!(%page_id, timeout = ?state.request_timeout(), "Badge request timed out");
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    };
    state.stats().record(start.elapsed());
    response
}

async fn ping() -> &'static str {
    PONG
}

/// `/status` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
    /// Entries currently held by the counter cache.
    pub cached_hashes: u64,
    /// Badges served since start.
    pub processed_requests: u64,
    /// Time since start.
    #[serde(with = "humantime_serde")]
    pub uptime: Duration,
    /// Project repository.
    pub source_code_repository: String,
    /// `ok`, or why the store probe failed.
    pub redis_status: String,
    /// Mean time to serve a badge.
    pub average_response_ms: f64,
}

async fn probe(state: &AppState) -> StoreResult<()> {
    let store = state.service().cache().store();
    bounded(store.name(), "ping", state.store_timeout(), store.ping()).await
}

async fn status(State(state): State<AppState>) -> Json<Status> {
    let redis_status = match probe(&state).await {
        Ok(()) => "ok".to_owned(),
        Err(error) => error.to_string(),
    };
    let stats = state.stats();
    Json(Status {
        cached_hashes: state.service().cache().entry_count(),
        processed_requests: stats.processed(),
        uptime: stats.uptime(),
        source_code_repository: REPOSITORY.to_owned(),
        redis_status,
        average_response_ms: stats.average_response_ms(),
    })
}

async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match probe(&state).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(error) => {
            warn!(%error, "Health probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}

async fn index() -> Redirect {
    Redirect::temporary(REPOSITORY)
}

/// `/rec` query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecoverQuery {
    page_id: Option<String>,
    count: Option<String>,
}

async fn recover(State(state): State<AppState>, Query(query): Query<RecoverQuery>) -> Response {
    let Some(page_id) = present(query.page_id) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(delta) = query.count.as_deref().and_then(|count| count.parse::<i64>().ok()) else {
        return (StatusCode::BAD_REQUEST, "count must be an integer").into_response();
    };

    match state.service().recover(&state.key(&page_id), delta).await {
        Ok(count) => {
            info!(%page_id, delta, views = %count, "Recovered page views");
            (StatusCode::OK, count.to_string()).into_response()
        }
        Err(error @ CacheError::StoreUnavailable(_)) => {
            warn!(%page_id, %error, "Recovery failed");
            (StatusCode::SERVICE_UNAVAILABLE, error.to_string()).into_response()
        }
        Err(error) => (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_parameter() {
        assert!(counts_hit(None));
        assert!(counts_hit(Some("")));
        assert!(counts_hit(Some("true")));
        assert!(counts_hit(Some("yes")));
        assert!(!counts_hit(Some("false")));
        assert!(!counts_hit(Some("no")));
        assert!(!counts_hit(Some("TRUE")));
    }

    #[test]
    fn test_empty_parameters_take_defaults() {
        let query = BadgeQuery {
            color: Some(String::new()),
            lcolor: Some("black".to_owned()),
            text: Some("Views".to_owned()),
            ..BadgeQuery::default()
        };
        let options = query.options();
        assert_eq!(options.colour, "blue");
        assert_eq!(options.label_colour, "black");
        assert_eq!(options.label, "Views");
        assert!(options.hit);
    }
}
