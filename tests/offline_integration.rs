//! Offline shell install and cache-first fetch

mod common;

use common::{MockServer, Reply};
use std::time::Duration;
use taxa_explorer::offline::{
    CacheManifest, CacheStorage, DiskCache, FetchEvent, ResponseSource, ServiceWorker,
    DEFAULT_CACHE_NAME,
};
use taxa_explorer::Error;
use url::Url;

fn shell_server() -> MockServer {
    MockServer::start(|_, path| match path {
        "/app/" | "/app/index.html" => Reply::bytes("text/html", b"<html>explorer</html>".to_vec()),
        "/app/style.css" => Reply::bytes("text/css", b"body{}".to_vec()),
        "/app/script.js" => Reply::bytes("application/javascript", b"search()".to_vec()),
        "/app/icon-192x192.jpg" | "/app/icon-512x512.jpg" => {
            Reply::bytes("image/jpeg", vec![0xff, 0xd8, 0xff])
        }
        "/app/live.json" => Reply::bytes("application/json", b"{}".to_vec()),
        _ => Reply::status(404),
    })
}

// no pooled connections, so nothing outlives the fixture
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn installed_assets_are_served_after_the_network_goes_away() {
    let server = shell_server();
    let scope = Url::parse(&server.url("/app/")).unwrap();
    let root = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(root.path(), DEFAULT_CACHE_NAME).unwrap();
    let worker = ServiceWorker::new(cache, client(), scope.clone());

    let stored = worker.install(&CacheManifest::default()).await.unwrap();
    assert_eq!(stored, 6);
    assert_eq!(worker.storage().keys().unwrap().len(), 6);

    // uncached requests go to the network and are not stored
    let live = worker.fetch_url("./live.json").await.unwrap();
    assert_eq!(live.source, ResponseSource::Network);
    assert!(!worker.storage().contains(live.response.url.as_str()).unwrap());

    server.shutdown();

    let css = worker.fetch_url("./style.css").await.unwrap();
    assert_eq!(css.source, ResponseSource::Cache);
    assert_eq!(css.response.body, b"body{}");
    assert_eq!(css.response.content_type.as_deref(), Some("text/css"));

    let err = worker.fetch(&FetchEvent::get("./live.json")).await.unwrap_err();
    assert!(matches!(err, Error::NetworkError(_)));

    // a reopened cache sees the same entries
    let reopened = DiskCache::open(root.path(), DEFAULT_CACHE_NAME).unwrap();
    assert!(reopened.contains(scope.join("index.html").unwrap().as_str()).unwrap());
}

#[tokio::test]
async fn install_stores_nothing_when_an_asset_is_missing() {
    let server = shell_server();
    let scope = Url::parse(&server.url("/app/")).unwrap();
    let root = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(root.path(), "partial").unwrap();
    let worker = ServiceWorker::new(cache, client(), scope);

    let mut manifest = CacheManifest::with_name("partial");
    manifest.assets.push("./manifest.webmanifest".to_string());

    let err = worker.install(&manifest).await.unwrap_err();
    assert!(matches!(err, Error::CacheError(_)));
    assert!(worker.storage().keys().unwrap().is_empty());
}

#[tokio::test]
async fn non_get_requests_skip_the_cache() {
    let server = shell_server();
    let scope = Url::parse(&server.url("/app/")).unwrap();
    let worker = ServiceWorker::new(
        taxa_explorer::offline::MemoryCache::new(DEFAULT_CACHE_NAME),
        client(),
        scope,
    );
    worker.install(&CacheManifest::default()).await.unwrap();

    let mut event = FetchEvent::get("./style.css");
    event.method = "POST".to_string();
    let res = worker.fetch(&event).await.unwrap();
    assert_eq!(res.source, ResponseSource::Network);
    assert_eq!(server.requests().last().map(String::as_str), Some("/app/style.css"));
}
