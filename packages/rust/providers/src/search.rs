//! Web search via the Serper API.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use blogsmith_shared::{BlogsmithError, Result, SearchConfig, env_secret};

use crate::USER_AGENT;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One entry in a search result list. Identity is position only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchRecord {
    Organic {
        title: String,
        link: String,
        snippet: String,
        date: Option<String>,
    },
    AnswerBox {
        snippet: String,
        link: Option<String>,
    },
    News {
        title: String,
        link: String,
        snippet: String,
        date: Option<String>,
        source: Option<String>,
    },
    Error {
        message: String,
    },
}

impl SearchRecord {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Usage counters for one provider instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub total_searches: u64,
    pub last_search_time: Option<DateTime<Utc>>,
    pub api_key_configured: bool,
}

/// A source of web and news search results.
///
/// Implementations never fail: problems come back as a one-element list
/// holding a [`SearchRecord::Error`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Vec<SearchRecord>;
    async fn search_news(&self, query: &str, count: usize) -> Vec<SearchRecord>;
    fn stats(&self) -> SearchStats;
}

// ---------------------------------------------------------------------------
// Serper wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SerperQuery<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperItem>,
    #[serde(default)]
    answer_box: Option<SerperAnswerBox>,
    #[serde(default)]
    news: Vec<SerperItem>,
}

#[derive(Deserialize)]
struct SerperItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Deserialize)]
struct SerperAnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

// ---------------------------------------------------------------------------
// SerperSearch
// ---------------------------------------------------------------------------

/// [`SearchProvider`] backed by `google.serper.dev`.
pub struct SerperSearch {
    client: Client,
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    searches: AtomicU64,
    last_search: Mutex<Option<DateTime<Utc>>>,
}

impl SerperSearch {
    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(config, env_secret(&config.api_key_env))
    }

    /// Build with an explicit API key.
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlogsmithError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            searches: AtomicU64::new(0),
            last_search: Mutex::new(None),
        })
    }

    fn record_attempt(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_search.lock() {
            *last = Some(Utc::now());
        }
    }

    async fn post(&self, endpoint: &str, query: &str, count: usize) -> Result<SerperResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            BlogsmithError::missing_credential(format!(
                "{} not found in environment variables",
                self.api_key_env
            ))
        })?;

        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&SerperQuery { q: query, num: count })
            .send()
            .await
            .map_err(|e| BlogsmithError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlogsmithError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| BlogsmithError::parse(format!("{url}: invalid response body: {e}")))
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> Vec<SearchRecord> {
        self.record_attempt();

        let data = match self.post("search", query, count).await {
            Ok(data) => data,
            Err(BlogsmithError::MissingCredential { name }) => return vec![SearchRecord::error(name)],
            Err(e) => {
                warn!(error = %e, "web search failed");
                return vec![SearchRecord::error(format!("Search request failed: {e}"))];
            }
        };

        let mut results: Vec<SearchRecord> = data
            .organic
            .into_iter()
            .take(count)
            .map(|item| SearchRecord::Organic {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
                date: non_empty(item.date),
            })
            .collect();

        if let Some(answer_box) = data.answer_box {
            let snippet = non_empty(answer_box.answer)
                .or(non_empty(answer_box.snippet))
                .unwrap_or_default();
            results.insert(
                0,
                SearchRecord::AnswerBox {
                    snippet,
                    link: non_empty(answer_box.link),
                },
            );
        }

        info!(results = results.len(), "web search complete");
        results
    }

    #[instrument(skip(self))]
    async fn search_news(&self, query: &str, count: usize) -> Vec<SearchRecord> {
        self.record_attempt();

        let data = match self.post("news", query, count).await {
            Ok(data) => data,
            Err(BlogsmithError::MissingCredential { name }) => return vec![SearchRecord::error(name)],
            Err(e) => {
                warn!(error = %e, "news search failed");
                return vec![SearchRecord::error(format!("News search request failed: {e}"))];
            }
        };

        let results: Vec<SearchRecord> = data
            .news
            .into_iter()
            .take(count)
            .map(|item| SearchRecord::News {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
                date: non_empty(item.date),
                source: non_empty(item.source),
            })
            .collect();

        info!(results = results.len(), "news search complete");
        results
    }

    fn stats(&self) -> SearchStats {
        SearchStats {
            total_searches: self.searches.load(Ordering::Relaxed),
            last_search_time: self.last_search.lock().ok().and_then(|last| *last),
            api_key_configured: self.api_key.is_some(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render search records as a Markdown block for a prompt.
///
/// The answer box (if any) comes first, news entries show their source and
/// date, and a lone error record collapses to a single line.
pub fn format_search_results(records: &[SearchRecord]) -> String {
    if records.is_empty() {
        return "No search results found.".into();
    }

    if let [SearchRecord::Error { message }] = records {
        return format!("Search error: {message}");
    }

    let mut out = String::from("### Search Results:\n\n");

    for (i, record) in records.iter().enumerate() {
        let n = i + 1;
        match record {
            SearchRecord::Error { message } => {
                out.push_str(&format!("{n}. Error: {message}\n\n"));
            }
            SearchRecord::AnswerBox { snippet, link } => {
                out.push_str("**Answer Box:**\n");
                out.push_str(&format!("- {snippet}\n"));
                if let Some(link) = link {
                    out.push_str(&format!("- Source: {link}\n"));
                }
                out.push('\n');
            }
            SearchRecord::News {
                title,
                link,
                snippet,
                date,
                source,
            } => {
                out.push_str(&format!("{n}. **{}**\n", or_placeholder(title, "No title")));
                out.push_str(&format!(
                    "   - Source: {}\n",
                    source.as_deref().unwrap_or("Unknown")
                ));
                if let Some(date) = date {
                    out.push_str(&format!("   - Date: {date}\n"));
                }
                out.push_str(&format!(
                    "   - Summary: {}\n",
                    or_placeholder(snippet, "No summary available")
                ));
                out.push_str(&format!("   - Link: {link}\n\n"));
            }
            SearchRecord::Organic {
                title,
                link,
                snippet,
                date,
            } => {
                out.push_str(&format!("{n}. **{}**\n", or_placeholder(title, "No title")));
                out.push_str(&format!(
                    "   - Summary: {}\n",
                    or_placeholder(snippet, "No summary available")
                ));
                if let Some(date) = date {
                    out.push_str(&format!("   - Date: {date}\n"));
                }
                out.push_str(&format!("   - Link: {link}\n\n"));
            }
        }
    }

    out
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}
