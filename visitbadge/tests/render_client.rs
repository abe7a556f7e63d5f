//! Render client against mock renderers.

use std::sync::Arc;
use std::time::Duration;

use visitbadge::render::{Band, CircuitBreaker, RenderClient, RenderError};
use visitbadge::{BadgeOptions, RenderConfig};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIMARY_SVG: &str = "<svg>primary</svg>";
const FALLBACK_SVG: &str = "<svg>fallback</svg>";

async fn renderer(status: u16, body: &str, expected: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/badge/.+"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(expected)
        .mount(&server)
        .await;
    server
}

fn client(primary: &MockServer, fallback: &MockServer, breaker: CircuitBreaker) -> RenderClient {
    let config = RenderConfig {
        primary: primary.uri(),
        fallback: fallback.uri(),
        timeout: Duration::from_millis(500),
    };
    RenderClient::with_breaker(&config, Arc::new(breaker)).unwrap()
}

fn options(text: &str) -> BadgeOptions {
    BadgeOptions::default().with_text(text)
}

#[tokio::test]
async fn test_primary_success_returns_body_unmodified() {
    let primary = renderer(200, PRIMARY_SVG, 1).await;
    let fallback = renderer(200, FALLBACK_SVG, 0).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    let body = client.render(&options("1")).await;
    assert_eq!(body, PRIMARY_SVG.as_bytes());
    assert_eq!(client.breaker().errors(), 0);
}

#[tokio::test]
async fn test_request_layout() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/badge/Page--views-1__024-green"))
        .and(query_param("labelColor", "black"))
        .and(query_param("style", "for-the-badge"))
        .and(query_param("logo", "github"))
        .and(query_param("logoColor", "white"))
        .and(header("accept", "image/svg+xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRIMARY_SVG))
        .expect(1)
        .mount(&primary)
        .await;
    let fallback = renderer(200, FALLBACK_SVG, 0).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    let badge = BadgeOptions {
        label: "Page-views".to_owned(),
        colour: "green".to_owned(),
        label_colour: "black".to_owned(),
        style: "for-the-badge".to_owned(),
        logo: "github".to_owned(),
        ..options("1_024")
    };
    assert_eq!(client.render(&badge).await, PRIMARY_SVG.as_bytes());
}

#[tokio::test]
async fn test_primary_failure_retries_on_fallback() {
    let primary = renderer(500, "boom", 1).await;
    let fallback = renderer(200, FALLBACK_SVG, 1).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    let body = client.render(&options("3")).await;
    assert_eq!(body, FALLBACK_SVG.as_bytes());
    assert_eq!(client.breaker().errors(), 1);
    assert!(!client.breaker().is_tripped());
}

#[tokio::test]
async fn test_two_failures_yield_empty_placeholder() {
    let primary = renderer(503, "down", 1).await;
    let fallback = renderer(404, "missing", 1).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    let body = client.render(&options("3")).await;
    assert!(body.is_empty());
    assert_eq!(client.breaker().errors(), 2);
}

#[tokio::test]
async fn test_slow_primary_counts_as_failure() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PRIMARY_SVG)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&primary)
        .await;
    let fallback = renderer(200, FALLBACK_SVG, 1).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    assert_eq!(client.render(&options("9")).await, FALLBACK_SVG.as_bytes());
    assert_eq!(client.breaker().errors(), 1);
}

#[tokio::test]
async fn test_failure_at_threshold_switches_later_calls_to_fallback() {
    let primary = renderer(500, "boom", 1).await;
    let fallback = renderer(200, FALLBACK_SVG, 3).await;
    let client = client(&primary, &fallback, CircuitBreaker::starting_at(5));

    // This call still tries the primary.
    assert_eq!(client.render(&options("1")).await, FALLBACK_SVG.as_bytes());
    assert_eq!(client.breaker().errors(), 6);
    assert_eq!(client.breaker().band(), Band::Degraded);

    // Later calls skip it.
    assert_eq!(client.render(&options("2")).await, FALLBACK_SVG.as_bytes());
    assert_eq!(client.render(&options("3")).await, FALLBACK_SVG.as_bytes());
    assert!(client.breaker().is_tripped());
}

#[tokio::test]
async fn test_degraded_band_uses_fallback_only() {
    for errors in 6..=9 {
        let primary = renderer(200, PRIMARY_SVG, 0).await;
        let fallback = renderer(200, FALLBACK_SVG, 1).await;
        let client = client(&primary, &fallback, CircuitBreaker::starting_at(errors));

        assert_eq!(client.render(&options("1")).await, FALLBACK_SVG.as_bytes());
        assert_eq!(client.breaker().errors(), errors);
    }
}

#[tokio::test]
async fn test_saturated_band_uses_fallback_only() {
    let primary = renderer(200, PRIMARY_SVG, 0).await;
    let fallback = renderer(200, FALLBACK_SVG, 1).await;
    let client = client(&primary, &fallback, CircuitBreaker::starting_at(25));

    assert_eq!(client.render(&options("1")).await, FALLBACK_SVG.as_bytes());
    assert_eq!(client.breaker().band(), Band::Saturated);
}

#[tokio::test]
async fn test_tripped_breaker_retries_fallback_once_then_placeholder() {
    let primary = renderer(200, PRIMARY_SVG, 0).await;
    let fallback = renderer(500, "boom", 2).await;
    let client = client(&primary, &fallback, CircuitBreaker::starting_at(8));

    assert!(client.render(&options("1")).await.is_empty());
    assert_eq!(client.breaker().errors(), 10);
}

#[tokio::test]
async fn test_try_render_reports_status() {
    let primary = renderer(502, "bad gateway", 1).await;
    let fallback = renderer(200, FALLBACK_SVG, 0).await;
    let client = client(&primary, &fallback, CircuitBreaker::new());

    let error = client
        .try_render(client.primary(), &options("1"))
        .await
        .unwrap_err();
    assert!(matches!(error, RenderError::Status { status, .. } if status.as_u16() == 502));
    // Single attempts leave the breaker alone.
    assert_eq!(client.breaker().errors(), 0);
}

#[tokio::test]
async fn test_invalid_endpoint_fails_construction() {
    let config = RenderConfig {
        primary: "::not a url::".to_owned(),
        ..RenderConfig::default()
    };
    assert!(matches!(RenderClient::new(&config), Err(RenderError::Url(_))));
}
