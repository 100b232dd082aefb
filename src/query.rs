//! Query builder for the taxa search endpoint.
//!
//! Turns a term, a page number and an optional filter into a fully formed
//! GET URL. Page size is fixed at [`PER_PAGE`].

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Results per page requested from the API.
pub const PER_PAGE: u32 = 5;

/// Taxonomic rank level as understood by the `rank_level` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankLevel(pub u32);

impl RankLevel {
    pub const SUBSPECIES: RankLevel = RankLevel(5);
    pub const SPECIES: RankLevel = RankLevel(10);
    pub const GENUS: RankLevel = RankLevel(20);
    pub const FAMILY: RankLevel = RankLevel(30);
    pub const ORDER: RankLevel = RankLevel(40);
    pub const CLASS: RankLevel = RankLevel(50);
    pub const PHYLUM: RankLevel = RankLevel(60);
    pub const KINGDOM: RankLevel = RankLevel(70);

    /// Level 0 means "any rank" and is never sent.
    pub fn is_filter(self) -> bool {
        self.0 > 0
    }
}

impl FromStr for RankLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u32>() {
            return Ok(RankLevel(n));
        }
        let level = match s.to_ascii_lowercase().as_str() {
            "any" | "all" => RankLevel(0),
            "subspecies" => Self::SUBSPECIES,
            "species" => Self::SPECIES,
            "genus" => Self::GENUS,
            "family" => Self::FAMILY,
            "order" => Self::ORDER,
            "class" => Self::CLASS,
            "phylum" => Self::PHYLUM,
            "kingdom" => Self::KINGDOM,
            other => return Err(Error::InvalidQuery(format!("unknown rank level '{}'", other))),
        };
        Ok(level)
    }
}

impl fmt::Display for RankLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level "iconic" categories accepted by the `iconic_taxa[]` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IconicTaxon {
    Plantae,
    Animalia,
    Aves,
    Amphibia,
    Reptilia,
    Mammalia,
    Actinopterygii,
    Mollusca,
    Arachnida,
    Insecta,
    Fungi,
    Chromista,
    Protozoa,
}

impl IconicTaxon {
    pub const ALL: [IconicTaxon; 13] = [
        IconicTaxon::Plantae,
        IconicTaxon::Animalia,
        IconicTaxon::Aves,
        IconicTaxon::Amphibia,
        IconicTaxon::Reptilia,
        IconicTaxon::Mammalia,
        IconicTaxon::Actinopterygii,
        IconicTaxon::Mollusca,
        IconicTaxon::Arachnida,
        IconicTaxon::Insecta,
        IconicTaxon::Fungi,
        IconicTaxon::Chromista,
        IconicTaxon::Protozoa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IconicTaxon::Plantae => "Plantae",
            IconicTaxon::Animalia => "Animalia",
            IconicTaxon::Aves => "Aves",
            IconicTaxon::Amphibia => "Amphibia",
            IconicTaxon::Reptilia => "Reptilia",
            IconicTaxon::Mammalia => "Mammalia",
            IconicTaxon::Actinopterygii => "Actinopterygii",
            IconicTaxon::Mollusca => "Mollusca",
            IconicTaxon::Arachnida => "Arachnida",
            IconicTaxon::Insecta => "Insecta",
            IconicTaxon::Fungi => "Fungi",
            IconicTaxon::Chromista => "Chromista",
            IconicTaxon::Protozoa => "Protozoa",
        }
    }
}

impl FromStr for IconicTaxon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        IconicTaxon::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidQuery(format!("unknown iconic taxon '{}'", wanted)))
    }
}

impl fmt::Display for IconicTaxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional narrowing of a search by rank and/or category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub rank_level: Option<RankLevel>,
    pub iconic_taxa: Vec<IconicTaxon>,
}

impl SearchFilter {
    pub fn rank(level: RankLevel) -> Self {
        Self {
            rank_level: Some(level),
            iconic_taxa: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.rank_level.map(RankLevel::is_filter).unwrap_or(false) && self.iconic_taxa.is_empty()
    }
}

/// Variant switches for the request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Adds `quality_grade=research` and `identifications=any`
    pub research_grade_only: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            research_grade_only: true,
        }
    }
}

/// One page request against the taxa endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub page: u32,
    pub filter: SearchFilter,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, page: u32, filter: SearchFilter) -> Self {
        Self {
            term: term.into(),
            page,
            filter,
        }
    }

    /// Build the GET URL for this query under `api_base` (e.g. `https://api.inaturalist.org/v1`).
    pub fn to_url(&self, api_base: &Url, options: &QueryOptions) -> Result<Url> {
        let term = self.term.trim();
        if term.is_empty() {
            return Err(Error::InvalidQuery("search term is empty".into()));
        }
        if self.page == 0 {
            return Err(Error::InvalidQuery("page numbers start at 1".into()));
        }

        let mut url = taxa_endpoint(api_base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", term)
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &self.page.to_string());
            if options.research_grade_only {
                pairs
                    .append_pair("quality_grade", "research")
                    .append_pair("identifications", "any");
            }
            if let Some(level) = self.filter.rank_level.filter(|l| l.is_filter()) {
                pairs.append_pair("rank_level", &level.to_string());
            }
            for taxon in &self.filter.iconic_taxa {
                pairs.append_pair("iconic_taxa[]", taxon.as_str());
            }
        }
        Ok(url)
    }
}

fn taxa_endpoint(api_base: &Url) -> Result<Url> {
    // Url::join drops the last segment unless the base ends with '/'
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("taxa")
        .map_err(|e| Error::InvalidQuery(format!("bad API base '{}': {}", api_base, e)))
}
