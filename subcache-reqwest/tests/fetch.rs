//! `FetchCache` against a wiremock upstream.

use pretty_assertions::assert_eq;
use reqwest::{Client, Method, Request};
use serde_json::json;
use subcache::{Cache, CacheStatus, CachingStrategy, StrategyOptions};
use subcache_moka::MokaStore;
use subcache_reqwest::{FetchCache, FetchOptions, ResponseBody, ReturnType};
use subcache_test::{ManualClock, MockStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn moka_fetch() -> FetchCache {
    let store = MokaStore::builder().max_entries(100).build();
    FetchCache::new(Client::new(), Cache::new(store))
}

fn get(server: &MockServer, route: &str) -> Request {
    let url = format!("{}{route}", server.uri());
    Request::new(Method::GET, url.parse().unwrap())
}

#[tokio::test]
async fn miss_then_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Hello from server"}))
                .insert_header("x-upstream", "yes"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetch = moka_fetch();

    let (first, ctx) = fetch
        .fetch_with_cache(get(&server, "/data"), FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(ctx.status, CacheStatus::Miss);
    assert!(first.ok());
    fetch.cache().offload().wait_all().await;

    let (second, ctx) = fetch
        .fetch_with_cache(get(&server, "/data"), FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(ctx.status, CacheStatus::Hit);
    assert_eq!(second.status(), 200);
    assert_eq!(second.status_text(), "OK");
    assert_eq!(second.headers()["x-upstream"], "yes");
    assert_eq!(
        second.json::<serde_json::Value>().unwrap(),
        json!({"message": "Hello from server"})
    );
}

#[tokio::test]
async fn not_found_is_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(2)
        .mount(&server)
        .await;

    let fetch = moka_fetch();

    for _ in 0..2 {
        let (response, ctx) = fetch
            .fetch_with_cache(get(&server, "/missing"), FetchOptions::new())
            .await
            .unwrap();
        assert_eq!(ctx.status, CacheStatus::Miss);
        assert!(!response.ok());
        assert_eq!(response.status_text(), "Not Found");
        assert_eq!(response.text(), "nope");
        fetch.cache().offload().wait_all().await;
    }
}

#[tokio::test]
async fn post_is_not_cached_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 0})))
        .expect(2)
        .mount(&server)
        .await;

    let fetch = moka_fetch();
    let url = format!("{}/search", server.uri());

    for _ in 0..2 {
        let mut request = Request::new(Method::POST, url.parse().unwrap());
        *request.body_mut() = Some(reqwest::Body::from("{\"q\":\"shoes\"}"));
        let (_, ctx) = fetch
            .fetch_with_cache(request, FetchOptions::new())
            .await
            .unwrap();
        assert!(ctx.bypassed);
        fetch.cache().offload().wait_all().await;
    }
}

#[tokio::test]
async fn explicit_strategy_caches_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = moka_fetch();
    let url = format!("{}/graphql", server.uri());
    let options = || FetchOptions::new().strategy(CachingStrategy::default());

    for expected in [CacheStatus::Miss, CacheStatus::Hit] {
        let mut request = Request::new(Method::POST, url.parse().unwrap());
        *request.body_mut() = Some(reqwest::Body::from("{\"query\":\"{ shop }\"}"));
        let (_, ctx) = fetch.fetch_with_cache(request, options()).await.unwrap();
        assert_eq!(ctx.status, expected);
        fetch.cache().offload().wait_all().await;
    }
}

#[tokio::test]
async fn response_predicate_can_veto_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": ["partial"]})))
        .expect(2)
        .mount(&server)
        .await;

    let fetch = moka_fetch();
    let options = || {
        FetchOptions::new().should_cache_response(|body, _| match body {
            ResponseBody::Json(value) => value.get("errors").is_none(),
            _ => true,
        })
    };

    for _ in 0..2 {
        let (_, ctx) = fetch
            .fetch_with_cache(get(&server, "/flaky"), options())
            .await
            .unwrap();
        assert_eq!(ctx.status, CacheStatus::Miss);
        fetch.cache().offload().wait_all().await;
    }
}

#[tokio::test]
async fn non_json_body_falls_back_to_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let fetch = moka_fetch();
    let (response, _) = fetch
        .fetch_with_cache(
            get(&server, "/page"),
            FetchOptions::new().return_type(ReturnType::Json),
        )
        .await
        .unwrap();

    assert_eq!(response.body(), &ResponseBody::Text("<html></html>".to_owned()));

    let http = response.into_http();
    assert_eq!(http.body().as_ref(), b"<html></html>");
}

#[tokio::test]
async fn stale_response_is_served_and_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": 10})))
        .expect(2)
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let store = MockStore::with_clock(clock.clone());
    let cache = Cache::builder()
        .store(store.clone())
        .clock(clock.clone())
        .build();
    let fetch = FetchCache::new(Client::new(), cache);
    let strategy = CachingStrategy::short(StrategyOptions::default()).unwrap();
    let options = || FetchOptions::new().strategy(strategy.clone());

    let (_, ctx) = fetch
        .fetch_with_cache(get(&server, "/prices"), options())
        .await
        .unwrap();
    assert_eq!(ctx.status, CacheStatus::Miss);
    fetch.cache().offload().wait_all().await;

    clock.advance_secs(3);

    let (response, ctx) = fetch
        .fetch_with_cache(get(&server, "/prices"), options())
        .await
        .unwrap();
    assert_eq!(ctx.status, CacheStatus::Stale);
    assert!(ctx.revalidation_scheduled);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"price": 10}));
    fetch.cache().offload().wait_all().await;

    assert_eq!(store.put_count(), 2);
}

#[tokio::test]
async fn display_name_is_stored_with_the_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let store = MockStore::new();
    let fetch = FetchCache::new(Client::new(), Cache::new(store.clone()));
    let options = FetchOptions::new().key("menu").display_name("Menu API");

    fetch
        .fetch_with_cache(get(&server, "/menu"), options)
        .await
        .unwrap();
    fetch.cache().offload().wait_all().await;

    let raw = store.raw("https://subcache.internal/menu").unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(envelope["debug_info"]["name"], "Menu API");
    assert_eq!(envelope["debug_info"]["key"], "menu");
}
