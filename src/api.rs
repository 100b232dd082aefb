//! HTTP client for the taxa search API.
//!
//! Every search goes through the shared [`RateLimiter`]; image downloads for
//! postcards do not, since they hit the photo CDN rather than the API.

use crate::query::{QueryOptions, SearchQuery};
use crate::rate_limit::RateLimiter;
use crate::{Error, ExplorerConfig, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Photo attached to a taxon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonPhoto {
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub square_url: Option<String>,
    #[serde(default)]
    pub attribution: Option<String>,
}

/// A single taxon as returned by the API. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub preferred_common_name: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub rank_level: Option<f32>,
    #[serde(default)]
    pub iconic_taxon_name: Option<String>,
    #[serde(default)]
    pub default_photo: Option<TaxonPhoto>,
}

impl TaxonRecord {
    pub fn photo_url(&self) -> Option<&str> {
        self.default_photo.as_ref().and_then(|p| p.medium_url.as_deref())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxaPage {
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    pub results: Vec<TaxonRecord>,
}

impl TaxaPage {
    /// Whether another page is likely to exist after `page`.
    pub fn has_more(&self, page: u32) -> bool {
        let per_page = self.per_page.unwrap_or(crate::query::PER_PAGE).max(1);
        match self.total_results {
            Some(total) => u64::from(page) * u64::from(per_page) < total,
            None => self.results.len() as u32 >= per_page,
        }
    }
}

/// Async client for the taxa endpoint.
#[derive(Debug)]
pub struct TaxaClient {
    http: Client,
    api_base: Url,
    options: QueryOptions,
    limiter: RateLimiter,
}

impl TaxaClient {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        let api_base = Url::parse(&config.api_base_url)
            .map_err(|e| Error::ConfigError(format!("api_base_url '{}': {}", config.api_base_url, e)))?;

        Ok(Self {
            http,
            api_base,
            options: config.query_options(),
            limiter: RateLimiter::new(Duration::from_millis(config.min_request_interval_ms)),
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Fetch one page of results, waiting for the rate limiter first.
    pub async fn search(&self, query: &SearchQuery) -> Result<TaxaPage> {
        let url = query.to_url(&self.api_base, &self.options)?;

        self.limiter.acquire().await;
        log::debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::NetworkError(format!("HTTP GET failed: {}", e)))?;

        check_status(resp.status())?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))?;
        let page: TaxaPage =
            serde_json::from_slice(&body).map_err(|e| Error::DecodeError(e.to_string()))?;

        log::info!(
            "search '{}' page {} returned {} result(s)",
            query.term.trim(),
            query.page,
            page.results.len()
        );
        Ok(page)
    }

    /// Download raw bytes (used for photos). Not rate limited.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        fetch_bytes(&self.http, url).await
    }
}

pub(crate) fn build_http_client(config: &ExplorerConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) async fn fetch_bytes(http: &Client, url: &str) -> Result<Vec<u8>> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::NetworkError(format!("HTTP GET {} failed: {}", url, e)))?;
    check_status(resp.status())?;
    let body = resp
        .bytes()
        .await
        .map_err(|e| Error::NetworkError(format!("Failed to read {}: {}", url, e)))?;
    Ok(body.to_vec())
}

fn check_status(status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    log::warn!("API responded with status {}", status);
    if status == StatusCode::SERVICE_UNAVAILABLE {
        Err(Error::ServiceUnavailable)
    } else {
        Err(Error::HttpStatus(status.as_u16()))
    }
}
