//! End-to-end badge serving over an in-memory store and a mock renderer.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use visitbadge::offload::OffloadManager;
use visitbadge::render::RenderClient;
use visitbadge::{BadgeRequest, BadgeService, CacheConfig, CacheKey, RenderConfig, ServiceConfig};
use visitbadge_store::{CounterStore, MemoryStore, StoreError, StoreResult};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SVG: &str = "<svg>badge</svg>";

struct DownStore;

#[async_trait]
impl CounterStore for DownStore {
    async fn increment(&self, _key: &CacheKey) -> StoreResult<u64> {
        Err(refused())
    }

    async fn get(&self, _key: &CacheKey) -> StoreResult<u64> {
        Err(refused())
    }

    async fn add(&self, _key: &CacheKey, _delta: u64) -> StoreResult<u64> {
        Err(refused())
    }
}

fn refused() -> StoreError {
    StoreError::Connection(Box::new(io::Error::from(io::ErrorKind::ConnectionRefused)))
}

fn config(renderer: &MockServer) -> ServiceConfig {
    ServiceConfig {
        render: RenderConfig {
            primary: renderer.uri(),
            fallback: renderer.uri(),
            timeout: Duration::from_secs(1),
        },
        ..ServiceConfig::default()
    }
}

fn service<St: CounterStore + 'static>(store: St, renderer: &MockServer) -> BadgeService<St> {
    BadgeService::from_config(store, Duration::from_secs(1), &config(renderer)).unwrap()
}

async fn mount_badge(server: &MockServer, badge_path: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(badge_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(SVG))
        .expect(expected)
        .mount(server)
        .await;
}

fn key(page: &str) -> CacheKey {
    CacheKey::digest(page, "service-tests")
}

#[tokio::test]
async fn test_unseen_page_renders_one() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-1-blue", 1).await;
    let store = MemoryStore::new();
    let service = service(store.clone(), &renderer);
    let k = key("fresh");

    let badge = service.badge(BadgeRequest::new(k.clone())).await;

    assert_eq!(badge.text, "1");
    assert_eq!(badge.body, SVG.as_bytes());
    assert_eq!(badge.headers[CONTENT_TYPE], "image/svg+xml");
    assert_eq!(badge.headers[CACHE_CONTROL], "no-cache,max-age=0");
    assert_eq!(store.get(&k).await.unwrap(), 1);
    assert_eq!(
        service.cache().cached(&k).await.as_deref(),
        Some(b"1".as_slice())
    );
}

#[tokio::test]
async fn test_repeated_hits_count_up_and_drain_on_shutdown() {
    let renderer = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/badge/Visitors-\d+-blue$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SVG))
        .expect(12)
        .mount(&renderer)
        .await;
    let store = MemoryStore::new();
    let service = service(store.clone(), &renderer);
    let k = key("popular");

    for expected in 1..=12 {
        let badge = service.badge(BadgeRequest::new(k.clone())).await;
        assert_eq!(badge.text, expected.to_string());
    }

    assert_eq!(service.shutdown(Duration::from_secs(5)).await, 0);
    assert_eq!(store.get(&k).await.unwrap(), 12);
}

#[tokio::test]
async fn test_peek_does_not_count() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-7-blue", 2).await;
    let store = MemoryStore::new();
    let k = key("read-only");
    store.seed(&k, 7);
    let service = service(store.clone(), &renderer);

    for _ in 0..2 {
        let mut request = BadgeRequest::new(k.clone());
        request.options.hit = false;
        assert_eq!(service.badge(request).await.text, "7");
    }
    assert_eq!(store.get(&k).await.unwrap(), 7);
}

#[tokio::test]
async fn test_custom_template_and_cacheable_headers() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-1%20views%20CNT-blue", 1).await;
    let service = service(MemoryStore::new(), &renderer);

    let mut request = BadgeRequest::new(key("templated"));
    request.custom = Some("CNT views CNT".to_owned());
    request.cacheable = true;
    let badge = service.badge(request).await;

    assert_eq!(badge.text, "1 views CNT");
    assert_eq!(badge.headers[CACHE_CONTROL], "max-age=600");
}

#[tokio::test]
async fn test_store_failure_renders_error_text() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-error-blue", 1).await;
    let service = service(DownStore, &renderer);

    let badge = service.badge(BadgeRequest::new(key("down"))).await;
    assert_eq!(badge.text, "error");
    assert_eq!(badge.body, SVG.as_bytes());
}

#[tokio::test]
async fn test_render_failure_still_serves_headers() {
    let renderer = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&renderer)
        .await;
    let service = service(MemoryStore::new(), &renderer);

    let badge = service.badge(BadgeRequest::new(key("unrendered"))).await;
    assert!(badge.body.is_empty());
    assert_eq!(badge.text, "1");
    assert_eq!(badge.headers[CONTENT_TYPE], "image/svg+xml");
    assert_eq!(service.render().breaker().errors(), 2);
}

#[tokio::test]
async fn test_recover_adds_views() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-1-blue", 1).await;
    mount_badge(&renderer, "/badge/Visitors-102-blue", 1).await;
    let store = MemoryStore::new();
    let service = service(store.clone(), &renderer);
    let k = key("recovered");

    service.badge(BadgeRequest::new(k.clone())).await;
    assert_eq!(service.recover(&k, 100).await.unwrap().as_str(), "101");
    assert!(service.recover(&k, -5).await.is_err());

    assert_eq!(service.badge(BadgeRequest::new(k.clone())).await.text, "102");
}

#[tokio::test]
async fn test_parts_can_be_wired_by_hand() {
    let renderer = MockServer::start().await;
    mount_badge(&renderer, "/badge/Visitors-1-blue", 1).await;
    let offload = OffloadManager::default();
    let cache = CacheConfig::default().build(MemoryStore::new(), offload.clone(), Duration::from_secs(1));
    let render = RenderClient::new(&config(&renderer).render).unwrap();
    let service = BadgeService::new(cache, render, offload);

    assert_eq!(service.badge(BadgeRequest::new(key("manual"))).await.text, "1");
}
