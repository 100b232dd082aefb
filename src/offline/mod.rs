//! Offline shell: a named cache of static assets served cache-first.
//!
//! [`ServiceWorker::install`] pre-populates the cache from a fixed manifest;
//! [`ServiceWorker::fetch`] answers from the cache when it can and falls back
//! to the network otherwise.

pub mod cache;
pub mod service_worker;

pub use cache::{CacheStorage, CachedResponse, DiskCache, MemoryCache};
pub use service_worker::{FetchEvent, ResponseSource, ServiceWorker, ShellResponse};

/// Cache name used by the explorer page shell. Bump it to invalidate.
pub const DEFAULT_CACHE_NAME: &str = "inaturalist-explorer-00";

/// Assets cached on install, relative to the page base URL.
pub const DEFAULT_ASSETS: [&str; 6] = [
    "./",
    "./index.html",
    "./style.css",
    "./script.js",
    "./icon-192x192.jpg",
    "./icon-512x512.jpg",
];

/// Which cache to fill and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManifest {
    pub cache_name: String,
    pub assets: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CacheManifest {
    pub fn with_name(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Default::default()
        }
    }
}
