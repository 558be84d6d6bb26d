//! External data providers consumed by the stage agents.
//!
//! - [`search`]: web and news search (Serper)
//! - [`keywords`]: keyword ideas with search volume and bid metrics (Google Ads)
//!
//! Providers are constructed explicitly and injected into the agents that
//! use them; there are no process-wide instances.

pub mod keywords;
pub mod search;

pub use keywords::{
    Competition, GoogleAdsCredentials, GoogleAdsKeywordIdeas, KeywordIdeasProvider, KeywordMetric,
    KeywordQuery, KeywordRecord, KeywordSeeds, NO_KEYWORD_RESULTS, SUPPORTED_LOCATIONS,
    format_for_researcher, search_keywords,
};
pub use search::{SearchProvider, SearchRecord, SearchStats, SerperSearch, format_search_results};

/// User-Agent string for provider requests.
pub(crate) const USER_AGENT: &str = concat!("Blogsmith/", env!("CARGO_PKG_VERSION"));
