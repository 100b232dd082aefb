//! Taxa Explorer
//!
//! Search the iNaturalist taxa API by name with an optional rank or
//! category filter, page through results five at a time, and export a
//! "postcard" PNG combining a species photo with its names.
//!
//! # Features
//!
//! - **Throttled search**: at most one API request per second
//! - **Headless results view**: cards render to text, HTML or JSON
//! - **Postcards** (`postcard` feature, default): 600×400 PNG composition
//! - **Offline shell**: cache-first store for the page's static assets
//!
//! # Example
//!
//! ```no_run
//! use taxa_explorer::{Explorer, ExplorerConfig, SearchFilter};
//!
//! # async fn demo() -> taxa_explorer::Result<()> {
//! let mut explorer = Explorer::new(ExplorerConfig::default())?;
//! explorer.search("oak", SearchFilter::default()).await;
//! println!("{}", explorer.view().render_text());
//! explorer.load_more().await;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod api;
pub mod explorer;
pub mod offline;
pub mod query;
pub mod rate_limit;
pub mod session;
pub mod view;

// Postcard composition pulls in the image stack
#[cfg(feature = "postcard")]
pub mod postcard;
#[cfg(feature = "postcard")]
pub mod rendering;

pub mod cli;

pub use api::{TaxaClient, TaxaPage, TaxonRecord};
pub use explorer::Explorer;
pub use query::{IconicTaxon, QueryOptions, RankLevel, SearchFilter, SearchQuery};
pub use session::{FinishOutcome, SearchAction, SearchSession, SearchState, SearchStatus};
pub use view::{ResultsView, TaxonCard};

#[cfg(feature = "postcard")]
pub use postcard::{Postcard, PostcardOptions, PostcardSpec, PostcardStyle};

/// Default API root; `/taxa` is appended per request.
pub const DEFAULT_API_BASE: &str = "https://api.inaturalist.org/v1";

/// Configuration for an [`Explorer`]
///
/// Defaults follow the public page: research-grade results, one request per
/// second, and a postcard with a drop shadow and two labels.
///
/// # Examples
///
/// ```
/// let cfg = taxa_explorer::ExplorerConfig::default();
/// assert_eq!(cfg.min_request_interval_ms, 1000);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// API root, e.g. `https://api.inaturalist.org/v1`
    pub api_base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Minimum spacing between two API requests
    pub min_request_interval_ms: u64,
    /// Restrict to research-grade observations (`quality_grade=research`)
    pub research_grade_only: bool,
    /// Drop responses that arrive after a newer search was issued
    pub discard_stale_responses: bool,
    /// Root directory for offline caches
    pub cache_dir: PathBuf,
    /// Postcard layout
    #[cfg(feature = "postcard")]
    pub postcard: PostcardOptions,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            user_agent: concat!("taxa-explorer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30000,
            min_request_interval_ms: 1000,
            research_grade_only: true,
            discard_stale_responses: true,
            cache_dir: default_cache_dir(),
            #[cfg(feature = "postcard")]
            postcard: PostcardOptions::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            research_grade_only: self.research_grade_only,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api_base_url)
            .map_err(|e| Error::ConfigError(format!("api_base_url '{}': {}", self.api_base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "api_base_url must be http(s), got '{}'",
                base.scheme()
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::ConfigError("user_agent must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be positive".into()));
        }
        #[cfg(feature = "postcard")]
        {
            let f = self.postcard.image_fraction;
            if !(f > 0.0 && f <= 1.0) {
                return Err(Error::ConfigError(format!("image_fraction {} not in (0, 1]", f)));
            }
            if self.postcard.size.width == 0 || self.postcard.size.height == 0 {
                return Err(Error::ConfigError("postcard canvas must not be empty".into()));
            }
        }
        Ok(())
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taxa-explorer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert!(config.user_agent.starts_with("taxa-explorer/"));
        assert!(config.research_grade_only);
        assert!(config.discard_stale_responses);
        assert!(config.cache_dir.ends_with("taxa-explorer"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ExplorerConfig {
            api_base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = ExplorerConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
