//! Keyword ideas from the Google Ads `generateKeywordIdeas` REST endpoint.
//!
//! Query validation is the only thing in this module that returns an error
//! to the caller. Everything that can go wrong remotely comes back as a
//! single [`KeywordRecord::Error`].

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use blogsmith_shared::{BlogsmithError, KeywordsConfig, Result, env_secret};

use crate::USER_AGENT;

/// Geo target constants accepted by [`KeywordQuery::new`].
pub const SUPPORTED_LOCATIONS: [(&str, &str); 10] = [
    ("2840", "United States"),
    ("2036", "Australia"),
    ("2826", "United Kingdom"),
    ("2124", "Canada"),
    ("2250", "France"),
    ("2276", "Germany"),
    ("2380", "Italy"),
    ("2392", "Japan"),
    ("2484", "Mexico"),
    ("2528", "Netherlands"),
];

/// English.
const LANGUAGE_CONSTANT: &str = "languageConstants/1000";

/// Seed used when a topic search has nothing else to go on.
const FALLBACK_SEED: &str = "digital marketing";

/// Cap on keyword lines handed to the keyword researcher.
const MAX_FORMATTED_KEYWORDS: usize = 15;

/// Text returned by [`format_for_researcher`] when there is nothing usable.
pub const NO_KEYWORD_RESULTS: &str = "No keyword results available";

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Seed keywords, from a list or a comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSeeds(Vec<String>);

impl KeywordSeeds {
    /// Trim each seed and drop empty ones.
    pub fn new<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            seeds
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Split a comma-separated string.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for KeywordSeeds {
    fn from(csv: &str) -> Self {
        Self::parse(csv)
    }
}

impl From<Vec<String>> for KeywordSeeds {
    fn from(list: Vec<String>) -> Self {
        Self::new(list)
    }
}

/// A validated keyword-ideas request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
    keywords: Vec<String>,
    url: Option<String>,
    location: String,
}

impl KeywordQuery {
    /// Validate a request.
    ///
    /// At least one of `keywords` and `url` must be non-empty, and
    /// `location` must appear in [`SUPPORTED_LOCATIONS`].
    pub fn new(keywords: Option<KeywordSeeds>, url: Option<&str>, location: &str) -> Result<Self> {
        let keywords = keywords.unwrap_or_default();
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        if keywords.is_empty() && url.is_none() {
            return Err(BlogsmithError::validation(
                "keywords and url: at least one of them is required",
            ));
        }

        if !SUPPORTED_LOCATIONS.iter().any(|(id, _)| *id == location) {
            let allowed: Vec<String> = SUPPORTED_LOCATIONS
                .iter()
                .map(|(id, name)| format!("{id} ({name})"))
                .collect();
            return Err(BlogsmithError::validation(format!(
                "location_id '{location}' should be one of: {}",
                allowed.join(", ")
            )));
        }

        let url = match url {
            Some(raw) => Some(
                Url::parse(raw)
                    .map_err(|e| BlogsmithError::validation(format!("invalid seed url '{raw}': {e}")))?
                    .to_string(),
            ),
            None => None,
        };

        Ok(Self {
            keywords: keywords.0,
            url,
            location: location.to_string(),
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Competition level reported for a keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Competition {
    #[default]
    Unspecified,
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

/// Metrics for one keyword idea. Bids are in account currency units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMetric {
    pub text: String,
    pub competition: Competition,
    pub low_top_of_page_bid: f64,
    pub high_top_of_page_bid: f64,
    pub average_cpc: f64,
    pub avg_monthly_searches: i64,
}

/// One entry in a keyword-ideas result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeywordRecord {
    Idea(KeywordMetric),
    Error { message: String },
}

impl KeywordRecord {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A source of keyword ideas with volume and bid metrics.
#[async_trait]
pub trait KeywordIdeasProvider: Send + Sync {
    /// Fetch ideas for a validated query. Never fails; see [`KeywordRecord::Error`].
    async fn ideas(&self, query: &KeywordQuery) -> Vec<KeywordRecord>;
}

// ---------------------------------------------------------------------------
// Google Ads wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdeasRequest<'a> {
    language: &'static str,
    geo_target_constants: Vec<String>,
    include_adult_keywords: bool,
    keyword_plan_network: &'static str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
    historical_metrics_options: HistoricalMetricsOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyword_seed: Option<KeywordSeedBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_seed: Option<UrlSeedBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyword_and_url_seed: Option<KeywordAndUrlSeedBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalMetricsOptions {
    include_average_cpc: bool,
}

#[derive(Serialize)]
struct KeywordSeedBody<'a> {
    keywords: &'a [String],
}

#[derive(Serialize)]
struct UrlSeedBody<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct KeywordAndUrlSeedBody<'a> {
    url: &'a str,
    keywords: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeasResponse {
    #[serde(default)]
    results: Vec<IdeaResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdeaResult {
    #[serde(default)]
    text: String,
    #[serde(default)]
    keyword_idea_metrics: Option<IdeaMetrics>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct IdeaMetrics {
    #[serde(default)]
    competition: Competition,
    #[serde(default, deserialize_with = "int64")]
    avg_monthly_searches: i64,
    #[serde(default, deserialize_with = "int64")]
    low_top_of_page_bid_micros: i64,
    #[serde(default, deserialize_with = "int64")]
    high_top_of_page_bid_micros: i64,
    #[serde(default, deserialize_with = "int64")]
    average_cpc_micros: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google encodes int64 fields as JSON strings; accept either form.
fn int64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Num(i64),
        Str(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Num(n) => Ok(n),
        Int64::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn micros_to_units(micros: i64) -> f64 {
    micros as f64 / 1_000_000.0
}

impl From<IdeaResult> for KeywordMetric {
    fn from(idea: IdeaResult) -> Self {
        let metrics = idea.keyword_idea_metrics.unwrap_or_default();
        Self {
            text: idea.text,
            competition: metrics.competition,
            low_top_of_page_bid: micros_to_units(metrics.low_top_of_page_bid_micros),
            high_top_of_page_bid: micros_to_units(metrics.high_top_of_page_bid_micros),
            average_cpc: micros_to_units(metrics.average_cpc_micros),
            avg_monthly_searches: metrics.avg_monthly_searches,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Google Ads credentials. Either `access_token`, or the refresh triple
/// (`client_id`, `client_secret`, `refresh_token`), must be present.
#[derive(Debug, Clone, Default)]
pub struct GoogleAdsCredentials {
    pub developer_token: Option<String>,
    pub customer_id: Option<String>,
    pub login_customer_id: Option<String>,
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl GoogleAdsCredentials {
    /// Read every credential from the env vars named in config.
    pub fn from_env(config: &KeywordsConfig) -> Self {
        Self {
            developer_token: env_secret(&config.developer_token_env),
            customer_id: env_secret(&config.customer_id_env),
            login_customer_id: env_secret(&config.login_customer_id_env),
            access_token: env_secret(&config.access_token_env),
            client_id: env_secret(&config.client_id_env),
            client_secret: env_secret(&config.client_secret_env),
            refresh_token: env_secret(&config.refresh_token_env),
        }
    }

    /// Whether enough is configured to attempt a request.
    pub fn is_complete(&self) -> bool {
        self.developer_token.is_some()
            && self.customer_id.is_some()
            && (self.access_token.is_some()
                || (self.client_id.is_some()
                    && self.client_secret.is_some()
                    && self.refresh_token.is_some()))
    }
}

/// Strip the dashes from a `123-456-7890` style customer id.
fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ---------------------------------------------------------------------------
// GoogleAdsKeywordIdeas
// ---------------------------------------------------------------------------

/// [`KeywordIdeasProvider`] backed by the Google Ads REST API.
pub struct GoogleAdsKeywordIdeas {
    client: Client,
    credentials: GoogleAdsCredentials,
    base_url: String,
    token_url: String,
    api_version: String,
    page_size: u32,
    max_pages: u32,
}

impl GoogleAdsKeywordIdeas {
    /// Build from config, reading credentials from the environment.
    pub fn from_config(config: &KeywordsConfig) -> Result<Self> {
        Self::new(config, GoogleAdsCredentials::from_env(config))
    }

    /// Build with explicit credentials.
    pub fn new(config: &KeywordsConfig, credentials: GoogleAdsCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlogsmithError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            api_version: config.api_version.clone(),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        })
    }

    pub fn credentials(&self) -> &GoogleAdsCredentials {
        &self.credentials
    }

    /// Use the configured access token, or exchange the refresh token.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = &self.credentials.access_token {
            return Ok(token.clone());
        }

        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            self.credentials.client_id.as_deref(),
            self.credentials.client_secret.as_deref(),
            self.credentials.refresh_token.as_deref(),
        ) else {
            return Err(BlogsmithError::missing_credential("Google Ads OAuth credentials"));
        };

        debug!(token_url = %self.token_url, "exchanging refresh token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| BlogsmithError::Network(format!("token exchange: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlogsmithError::Network(format!("token exchange: HTTP {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BlogsmithError::parse(format!("token exchange: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        access_token: &str,
        developer_token: &str,
        query: &KeywordQuery,
        page_token: Option<&str>,
    ) -> Result<IdeasResponse> {
        let keywords = query.keywords();
        let (keyword_seed, url_seed, keyword_and_url_seed) = match (keywords.is_empty(), query.url()) {
            (false, None) => (Some(KeywordSeedBody { keywords }), None, None),
            (true, Some(url)) => (None, Some(UrlSeedBody { url }), None),
            (false, Some(url)) => (None, None, Some(KeywordAndUrlSeedBody { url, keywords })),
            (true, None) => {
                return Err(BlogsmithError::validation("query has neither keywords nor url"));
            }
        };

        let body = IdeasRequest {
            language: LANGUAGE_CONSTANT,
            geo_target_constants: vec![format!("geoTargetConstants/{}", query.location())],
            include_adult_keywords: false,
            keyword_plan_network: "GOOGLE_SEARCH",
            page_size: self.page_size,
            page_token,
            historical_metrics_options: HistoricalMetricsOptions {
                include_average_cpc: true,
            },
            keyword_seed,
            url_seed,
            keyword_and_url_seed,
        };

        let mut request = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .header("developer-token", developer_token)
            .json(&body);

        if let Some(login) = &self.credentials.login_customer_id {
            request = request.header("login-customer-id", normalize_customer_id(login));
        }

        let response = request
            .send()
            .await
            .map_err(|e| BlogsmithError::Network(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(BlogsmithError::Network(format!("HTTP {status}: {snippet}")));
        }

        response
            .json()
            .await
            .map_err(|e| BlogsmithError::parse(format!("invalid keyword ideas response: {e}")))
    }

    /// All pages for a query, up to `max_pages`.
    async fn collect_ideas(&self, query: &KeywordQuery) -> Result<Vec<KeywordMetric>> {
        let developer_token = self
            .credentials
            .developer_token
            .as_deref()
            .ok_or_else(|| BlogsmithError::missing_credential("Google Ads developer token"))?;
        let customer_id = self
            .credentials
            .customer_id
            .as_deref()
            .map(normalize_customer_id)
            .ok_or_else(|| BlogsmithError::missing_credential("Google Ads customer id"))?;

        let access_token = self.access_token().await?;
        let endpoint = format!(
            "{}/{}/customers/{customer_id}:generateKeywordIdeas",
            self.base_url, self.api_version
        );

        let mut ideas = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..self.max_pages {
            let response = self
                .fetch_page(
                    &endpoint,
                    &access_token,
                    developer_token,
                    query,
                    page_token.as_deref(),
                )
                .await?;

            debug!(page, results = response.results.len(), "keyword ideas page received");
            ideas.extend(response.results.into_iter().map(KeywordMetric::from));

            match response.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ideas)
    }
}

#[async_trait]
impl KeywordIdeasProvider for GoogleAdsKeywordIdeas {
    #[instrument(skip_all, fields(seeds = query.keywords().len(), location = %query.location()))]
    async fn ideas(&self, query: &KeywordQuery) -> Vec<KeywordRecord> {
        match self.collect_ideas(query).await {
            Ok(ideas) => {
                info!(ideas = ideas.len(), "keyword ideas generated");
                ideas.into_iter().map(KeywordRecord::Idea).collect()
            }
            Err(e) => {
                warn!(error = %e, "keyword idea generation failed");
                vec![KeywordRecord::error(format!("Keyword generation failed: {e}"))]
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers for the keyword researcher
// ---------------------------------------------------------------------------

/// Merge topic, keywords and seed keywords into one seed list and fetch ideas.
///
/// Comma-separated lists are split and trimmed, duplicates removed
/// case-insensitively (first occurrence wins). Fails only if the query does
/// not validate (e.g. unsupported location).
pub async fn search_keywords(
    provider: &dyn KeywordIdeasProvider,
    topic: &str,
    keywords: &str,
    seed_keywords: &str,
    location: &str,
) -> Result<Vec<KeywordRecord>> {
    let mut all: Vec<String> = Vec::new();

    let topic = topic.trim();
    if !topic.is_empty() {
        all.push(topic.to_string());
    }
    all.extend(KeywordSeeds::parse(keywords).0);
    all.extend(KeywordSeeds::parse(seed_keywords).0);

    if all.is_empty() {
        all.push(FALLBACK_SEED.to_string());
    }

    let mut seen = HashSet::new();
    all.retain(|k| seen.insert(k.to_lowercase()));

    let query = KeywordQuery::new(Some(KeywordSeeds(all)), None, location)?;
    Ok(provider.ideas(&query).await)
}

/// Render idea texts as a `•` bullet list for the keyword researcher.
pub fn format_for_researcher(records: &[KeywordRecord]) -> String {
    if records.is_empty() || matches!(records, [KeywordRecord::Error { .. }]) {
        return NO_KEYWORD_RESULTS.into();
    }

    let lines: Vec<String> = records
        .iter()
        .filter_map(|record| match record {
            KeywordRecord::Idea(metric) if !metric.text.trim().is_empty() => {
                Some(format!("• {}", metric.text))
            }
            _ => None,
        })
        .take(MAX_FORMATTED_KEYWORDS)
        .collect();

    if lines.is_empty() {
        return NO_KEYWORD_RESULTS.into();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> KeywordsConfig {
        KeywordsConfig {
            base_url: server.uri(),
            token_url: format!("{}/token", server.uri()),
            timeout_secs: 5,
            ..KeywordsConfig::default()
        }
    }

    fn token_credentials() -> GoogleAdsCredentials {
        GoogleAdsCredentials {
            developer_token: Some("dev-token".into()),
            customer_id: Some("123-456-7890".into()),
            access_token: Some("access".into()),
            ..GoogleAdsCredentials::default()
        }
    }

    fn idea(text: &str) -> KeywordRecord {
        KeywordRecord::Idea(KeywordMetric {
            text: text.into(),
            competition: Competition::Low,
            low_top_of_page_bid: 0.5,
            high_top_of_page_bid: 1.5,
            average_cpc: 1.0,
            avg_monthly_searches: 1000,
        })
    }

    #[test]
    fn query_requires_keywords_or_url() {
        let err = KeywordQuery::new(None, None, "2840").unwrap_err();
        assert!(matches!(err, BlogsmithError::Validation { .. }));

        let err = KeywordQuery::new(Some(KeywordSeeds::parse(" , ")), Some(""), "2840").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn query_rejects_unsupported_location() {
        let err = KeywordQuery::new(Some("shoes".into()), None, "9999").unwrap_err();
        assert!(matches!(err, BlogsmithError::Validation { .. }));
        assert!(err.to_string().contains("2840 (United States)"));
    }

    #[test]
    fn query_accepts_url_only() {
        let query = KeywordQuery::new(None, Some("https://shop.example/shoes"), "2826").unwrap();
        assert!(query.keywords().is_empty());
        assert_eq!(query.url(), Some("https://shop.example/shoes"));
        assert_eq!(query.location(), "2826");
    }

    #[test]
    fn seeds_from_comma_separated_string() {
        let seeds = KeywordSeeds::from("remote work,  benefits of remote work ,,work from home");
        assert_eq!(
            seeds.as_slice(),
            ["remote work", "benefits of remote work", "work from home"]
        );
    }

    #[test]
    fn metrics_decode_string_int64_and_micros() {
        let json = r#"{"text": "remote jobs", "keywordIdeaMetrics": {
            "competition": "HIGH", "avgMonthlySearches": "74000",
            "lowTopOfPageBidMicros": "1250000", "highTopOfPageBidMicros": 4000000,
            "averageCpcMicros": "2500000"}}"#;
        let result: IdeaResult = serde_json::from_str(json).unwrap();
        let metric = KeywordMetric::from(result);

        assert_eq!(metric.competition, Competition::High);
        assert_eq!(metric.avg_monthly_searches, 74_000);
        assert!((metric.low_top_of_page_bid - 1.25).abs() < f64::EPSILON);
        assert!((metric.high_top_of_page_bid - 4.0).abs() < f64::EPSILON);
        assert!((metric.average_cpc - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_competition_value_maps_to_unknown() {
        let c: Competition = serde_json::from_str(r#""SOMETHING_NEW""#).unwrap();
        assert_eq!(c, Competition::Unknown);
    }

    #[tokio::test]
    async fn ideas_follow_page_token() {
        let server = MockServer::start().await;
        let endpoint = "/v18/customers/1234567890:generateKeywordIdeas";

        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header("developer-token", "dev-token"))
            .and(header("authorization", "Bearer access"))
            .and(body_string_contains("\"pageToken\":\"page-2\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"text": "hybrid work"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_partial_json(serde_json::json!({
                "geoTargetConstants": ["geoTargetConstants/2840"],
                "keywordSeed": {"keywords": ["remote work"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"text": "remote work", "keywordIdeaMetrics": {"avgMonthlySearches": "100"}}],
                "nextPageToken": "page-2"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let config = KeywordsConfig {
            max_pages: 3,
            ..config_for(&server)
        };
        let provider = GoogleAdsKeywordIdeas::new(&config, token_credentials()).unwrap();
        let query = KeywordQuery::new(Some("remote work".into()), None, "2840").unwrap();

        let records = provider.ideas(&query).await;
        let texts: Vec<&str> = records
            .iter()
            .filter_map(|r| match r {
                KeywordRecord::Idea(m) => Some(m.text.as_str()),
                KeywordRecord::Error { .. } => None,
            })
            .collect();
        assert_eq!(texts, ["remote work", "hybrid work"]);
    }

    #[tokio::test]
    async fn refresh_token_is_exchanged_when_no_access_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "fresh", "expires_in": 3599})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v18/customers/1234567890:generateKeywordIdeas"))
            .and(header("authorization", "Bearer fresh"))
            .and(header("login-customer-id", "1112223333"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"text": "shoes"}]
            })))
            .mount(&server)
            .await;

        let credentials = GoogleAdsCredentials {
            developer_token: Some("dev-token".into()),
            customer_id: Some("1234567890".into()),
            login_customer_id: Some("111-222-3333".into()),
            client_id: Some("cid".into()),
            client_secret: Some("secret".into()),
            refresh_token: Some("refresh".into()),
            ..GoogleAdsCredentials::default()
        };
        assert!(credentials.is_complete());

        let provider = GoogleAdsKeywordIdeas::new(&config_for(&server), credentials).unwrap();
        let query = KeywordQuery::new(Some("shoes".into()), None, "2840").unwrap();

        let records = provider.ideas(&query).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_error());
    }

    #[tokio::test]
    async fn remote_failure_is_a_single_error_record() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let provider = GoogleAdsKeywordIdeas::new(&config_for(&server), token_credentials()).unwrap();
        let query = KeywordQuery::new(Some("shoes".into()), None, "2840").unwrap();

        let records = provider.ideas(&query).await;
        assert_eq!(records.len(), 1);
        match &records[0] {
            KeywordRecord::Error { message } => {
                assert!(message.starts_with("Keyword generation failed"));
                assert!(message.contains("403"));
            }
            other => panic!("expected error record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_is_an_error_record() {
        let server = MockServer::start().await;
        let provider =
            GoogleAdsKeywordIdeas::new(&config_for(&server), GoogleAdsCredentials::default()).unwrap();
        let query = KeywordQuery::new(Some("shoes".into()), None, "2840").unwrap();

        let records = provider.ideas(&query).await;
        assert!(matches!(records.as_slice(), [KeywordRecord::Error { .. }]));
    }

    struct Recording(std::sync::Mutex<Vec<KeywordQuery>>);

    #[async_trait]
    impl KeywordIdeasProvider for Recording {
        async fn ideas(&self, query: &KeywordQuery) -> Vec<KeywordRecord> {
            self.0.lock().unwrap().push(query.clone());
            vec![idea("remote work tips")]
        }
    }

    #[tokio::test]
    async fn search_keywords_merges_and_dedupes() {
        let provider = Recording(std::sync::Mutex::new(Vec::new()));
        let records = search_keywords(
            &provider,
            "Remote Work",
            "remote work, Home Office",
            "home office,async teams",
            "2840",
        )
        .await
        .unwrap();
        assert_eq!(records.len(), 1);

        let seen = provider.0.lock().unwrap();
        assert_eq!(seen[0].keywords(), ["Remote Work", "Home Office", "async teams"]);
    }

    #[tokio::test]
    async fn search_keywords_falls_back_to_default_seed() {
        let provider = Recording(std::sync::Mutex::new(Vec::new()));
        search_keywords(&provider, " ", "", "", "2840").await.unwrap();
        assert_eq!(provider.0.lock().unwrap()[0].keywords(), ["digital marketing"]);
    }

    #[test]
    fn format_for_researcher_limits_to_fifteen() {
        let records: Vec<KeywordRecord> = (0..20).map(|i| idea(&format!("kw {i}"))).collect();
        let text = format_for_researcher(&records);
        assert_eq!(text.lines().count(), 15);
        assert!(text.starts_with("• kw 0"));
    }

    #[test]
    fn format_for_researcher_handles_errors() {
        assert_eq!(format_for_researcher(&[]), NO_KEYWORD_RESULTS);
        assert_eq!(
            format_for_researcher(&[KeywordRecord::error("boom")]),
            NO_KEYWORD_RESULTS
        );
    }
}
