use super::cache::{CacheStorage, CachedResponse};
use super::CacheManifest;
use crate::{Error, Result};
use futures::future::try_join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::collections::HashMap;
use url::Url;

/// A request the shell is asked to answer
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request_url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
}

impl FetchEvent {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            request_url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct ShellResponse {
    pub source: ResponseSource,
    pub response: CachedResponse,
}

/// Cache-first fetch handler over a named [`CacheStorage`].
pub struct ServiceWorker<S: CacheStorage> {
    storage: S,
    http: Client,
    scope: Url,
}

impl<S: CacheStorage> ServiceWorker<S> {
    /// `scope` is the page base URL that manifest entries and relative
    /// requests are resolved against.
    pub fn new(storage: S, http: Client, scope: Url) -> Self {
        Self { storage, http, scope }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        self.scope
            .join(url)
            .map_err(|e| Error::CacheError(format!("cannot resolve '{}' against {}: {}", url, self.scope, e)))
    }

    /// Fetch every manifest asset and store them all, or store nothing if
    /// any fetch fails. Returns the number of entries written.
    pub async fn install(&self, manifest: &CacheManifest) -> Result<usize> {
        if manifest.cache_name != self.storage.name() {
            log::warn!(
                "manifest names cache '{}' but storage is '{}'",
                manifest.cache_name,
                self.storage.name()
            );
        }

        let urls = manifest
            .assets
            .iter()
            .map(|asset| self.resolve(asset))
            .collect::<Result<Vec<_>>>()?;

        let responses = try_join_all(urls.iter().map(|url| self.network_get(url))).await?;

        if let Some(bad) = responses.iter().find(|r| !(200..300).contains(&r.status)) {
            return Err(Error::CacheError(format!(
                "install aborted: {} answered {}",
                bad.url, bad.status
            )));
        }

        for response in &responses {
            self.storage.put(response)?;
        }
        log::info!(
            "installed {} asset(s) into cache '{}'",
            responses.len(),
            self.storage.name()
        );
        Ok(responses.len())
    }

    /// Answer from the cache when possible, otherwise from the network.
    /// Network responses are not stored.
    pub async fn fetch(&self, event: &FetchEvent) -> Result<ShellResponse> {
        let url = self.resolve(&event.request_url)?;
        let method = Method::from_bytes(event.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidQuery(format!("bad method '{}': {}", event.method, e)))?;

        if method == Method::GET {
            if let Some(hit) = self.storage.get(url.as_str())? {
                log::debug!("cache hit {}", url);
                return Ok(ShellResponse {
                    source: ResponseSource::Cache,
                    response: hit,
                });
            }
        }

        log::debug!("cache miss {}, going to network", url);
        let mut req = self.http.request(method, url.clone());
        for (name, value) in &event.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let response = read_response(url, req.send().await).await?;
        Ok(ShellResponse {
            source: ResponseSource::Network,
            response,
        })
    }

    pub async fn fetch_url(&self, url: &str) -> Result<ShellResponse> {
        self.fetch(&FetchEvent::get(url)).await
    }

    async fn network_get(&self, url: &Url) -> Result<CachedResponse> {
        read_response(url.clone(), self.http.get(url.clone()).send().await).await
    }
}

async fn read_response(
    url: Url,
    sent: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<CachedResponse> {
    let resp = sent.map_err(|e| Error::NetworkError(format!("GET {} failed: {}", url, e)))?;
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .bytes()
        .await
        .map_err(|e| Error::NetworkError(format!("Failed to read {}: {}", url, e)))?;
    Ok(CachedResponse {
        url: url.to_string(),
        status,
        content_type,
        body: body.to_vec(),
    })
}
