//! Application and per-run configuration for Blogsmith.
//!
//! User config lives at `~/.blogsmith/blogsmith.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file; it only names the env vars that
//! hold them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{BlogsmithError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "blogsmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".blogsmith";

/// Word count used when a brief leaves it unset.
pub const DEFAULT_WORD_COUNT: u32 = 1200;

// ---------------------------------------------------------------------------
// Config structs (matching blogsmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Completion service settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Web search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Keyword-ideas provider settings.
    #[serde(default)]
    pub keywords: KeywordsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory the finished blog post is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Word count for briefs that do not set one.
    #[serde(default = "default_word_count")]
    pub word_count: u32,

    /// Which text the proofreader edits.
    #[serde(default)]
    pub proofread_source: ProofreadSource,

    /// Abort on the first degraded stage instead of carrying on.
    #[serde(default)]
    pub strict: bool,

    /// Prefix the output file with a `# <topic>` heading.
    #[serde(default)]
    pub include_heading: bool,

    /// Run the Markdown tidy pass before writing. Off by default so the file
    /// holds the proofread text unchanged.
    #[serde(default)]
    pub tidy_markdown: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            word_count: default_word_count(),
            proofread_source: ProofreadSource::default(),
            strict: false,
            include_heading: false,
            tidy_markdown: false,
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_word_count() -> u32 {
    DEFAULT_WORD_COUNT
}

/// `[completion]` section: an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_completion_key_env")]
    pub api_key_env: String,

    /// Base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_completion_key_env(),
            base_url: default_completion_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    32_768
}
fn default_completion_timeout() -> u64 {
    300
}

/// `[search]` section: Serper web search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the Serper API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Serper base URL; `/search` and `/news` are appended.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_search_base_url() -> String {
    "https://google.serper.dev".into()
}
fn default_search_timeout() -> u64 {
    30
}

/// `[keywords]` section: Google Ads keyword ideas over REST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default = "default_developer_token_env")]
    pub developer_token_env: String,
    #[serde(default = "default_customer_id_env")]
    pub customer_id_env: String,
    #[serde(default = "default_login_customer_id_env")]
    pub login_customer_id_env: String,
    /// A ready-made OAuth access token; takes precedence over refresh.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
    #[serde(default = "default_refresh_token_env")]
    pub refresh_token_env: String,

    /// Google Ads API base URL.
    #[serde(default = "default_ads_base_url")]
    pub base_url: String,

    /// OAuth token endpoint used for refresh-token exchange.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Google Ads API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Geo target constant id; must be one of the supported locations.
    #[serde(default = "default_location")]
    pub location: String,

    /// Ideas requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on pages fetched per query.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            developer_token_env: default_developer_token_env(),
            customer_id_env: default_customer_id_env(),
            login_customer_id_env: default_login_customer_id_env(),
            access_token_env: default_access_token_env(),
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            refresh_token_env: default_refresh_token_env(),
            base_url: default_ads_base_url(),
            token_url: default_token_url(),
            api_version: default_api_version(),
            location: default_location(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_developer_token_env() -> String {
    "GOOGLE_ADS_DEVELOPER_TOKEN".into()
}
fn default_customer_id_env() -> String {
    "GOOGLE_ADS_CUSTOMER_ID".into()
}
fn default_login_customer_id_env() -> String {
    "GOOGLE_ADS_LOGIN_CUSTOMER_ID".into()
}
fn default_access_token_env() -> String {
    "GOOGLE_ADS_ACCESS_TOKEN".into()
}
fn default_client_id_env() -> String {
    "GOOGLE_ADS_CLIENT_ID".into()
}
fn default_client_secret_env() -> String {
    "GOOGLE_ADS_CLIENT_SECRET".into()
}
fn default_refresh_token_env() -> String {
    "GOOGLE_ADS_REFRESH_TOKEN".into()
}
fn default_ads_base_url() -> String {
    "https://googleads.googleapis.com".into()
}
fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".into()
}
fn default_api_version() -> String {
    "v18".into()
}
fn default_location() -> String {
    "2840".into()
}
fn default_page_size() -> u32 {
    20
}
fn default_max_pages() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Enumerated settings
// ---------------------------------------------------------------------------

/// Which text the proofreader receives.
///
/// `Draft` keeps the proofreader's word-count target exact against the
/// writer's output; `Seo` feeds it the SEO checker's revision instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofreadSource {
    #[default]
    Draft,
    Seo,
}

impl FromStr for ProofreadSource {
    type Err = BlogsmithError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "seo" => Ok(Self::Seo),
            other => Err(BlogsmithError::validation(format!(
                "proofread source must be 'draft' or 'seo', got '{other}'"
            ))),
        }
    }
}

/// Coarse length tier passed to the writer alongside the word count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl std::fmt::Display for LengthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthTier {
    type Err = BlogsmithError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" | "" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(BlogsmithError::validation(format!(
                "blog length must be short, medium or long, got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Run configuration (one pipeline execution)
// ---------------------------------------------------------------------------

/// Flat parameter set governing one pipeline run.
///
/// Every field has a default, so a brief file may set any subset of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub topic: String,
    pub keywords: String,
    pub tone: String,
    pub language: String,
    pub current_year: String,
    pub audience: String,
    pub word_count: u32,
    pub blog_length: LengthTier,
    pub include_keywords: String,
    pub avoid_keywords: String,
    pub intent: String,
    pub title: String,
    pub url: String,
    pub faq: bool,
    pub has_product: bool,
    pub product_name: String,
    pub product_url: String,
    pub product_image_url: String,
    pub product_description_text: String,
    pub product_price_min: String,
    pub product_price_max: String,
    pub product_currency: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            keywords: String::new(),
            tone: "professional".into(),
            language: "English".into(),
            current_year: current_year(),
            audience: "general".into(),
            word_count: DEFAULT_WORD_COUNT,
            blog_length: LengthTier::Medium,
            include_keywords: String::new(),
            avoid_keywords: String::new(),
            intent: "inform".into(),
            title: String::new(),
            url: String::new(),
            faq: false,
            has_product: false,
            product_name: String::new(),
            product_url: String::new(),
            product_image_url: String::new(),
            product_description_text: String::new(),
            product_price_min: String::new(),
            product_price_max: String::new(),
            product_currency: String::new(),
        }
    }
}

impl RunConfig {
    /// Fill blank optional fields with their defaults.
    ///
    /// Explicit values are kept; only empty strings and a zero word count
    /// are replaced.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        fill_blank(&mut self.tone, defaults.tone);
        fill_blank(&mut self.language, defaults.language);
        fill_blank(&mut self.current_year, defaults.current_year);
        fill_blank(&mut self.audience, defaults.audience);
        fill_blank(&mut self.intent, defaults.intent);
        if self.word_count == 0 {
            self.word_count = defaults.word_count;
        }
        self.topic = self.topic.trim().to_string();
        self.title = self.title.trim().to_string();
        self
    }

    /// Whether any product field is filled in.
    pub fn has_product_details(&self) -> bool {
        [
            &self.product_name,
            &self.product_url,
            &self.product_description_text,
        ]
        .iter()
        .any(|v| !v.trim().is_empty())
    }

    /// Explicit title, if the brief set one.
    pub fn explicit_title(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }
}

fn fill_blank(slot: &mut String, default: String) {
    if slot.trim().is_empty() {
        *slot = default;
    }
}

/// The current calendar year as text.
pub fn current_year() -> String {
    chrono::Local::now().year().to_string()
}

/// Load a run brief from a TOML or JSON file (chosen by extension).
///
/// A brief without a `word_count` key gets `default_word_count`.
pub fn load_brief(path: &Path, default_word_count: u32) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BlogsmithError::io(path, e))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let (mut run, sets_word_count) = if is_json {
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| brief_error(path, e))?;
        let sets_word_count = value.get("word_count").is_some();
        let run: RunConfig = serde_json::from_value(value).map_err(|e| brief_error(path, e))?;
        (run, sets_word_count)
    } else {
        let table: toml::Table = toml::from_str(&content).map_err(|e| brief_error(path, e))?;
        let sets_word_count = table.contains_key("word_count");
        let run: RunConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e| brief_error(path, e))?;
        (run, sets_word_count)
    };

    if !sets_word_count {
        run.word_count = default_word_count;
    }
    Ok(run)
}

fn brief_error(path: &Path, e: impl std::fmt::Display) -> BlogsmithError {
    BlogsmithError::validation(format!("failed to parse brief {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.blogsmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BlogsmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.blogsmith/blogsmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BlogsmithError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BlogsmithError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BlogsmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BlogsmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BlogsmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named env var; empty values count as absent.
pub fn env_secret(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("SERPER_API_KEY"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/blogs"
proofread_source = "seo"

[completion]
model = "gpt-4o"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/blogs");
        assert_eq!(config.defaults.proofread_source, ProofreadSource::Seo);
        assert!(!config.defaults.tidy_markdown);
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.completion.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.keywords.location, "2840");
        assert_eq!(config.keywords.page_size, 20);
    }

    #[test]
    fn run_config_defaults() {
        let run = RunConfig::default();
        assert_eq!(run.tone, "professional");
        assert_eq!(run.language, "English");
        assert_eq!(run.audience, "general");
        assert_eq!(run.word_count, 1200);
        assert_eq!(run.blog_length, LengthTier::Medium);
        assert_eq!(run.intent, "inform");
        assert_eq!(run.current_year, current_year());
        assert!(!run.faq);
        assert!(!run.has_product);
    }

    #[test]
    fn normalized_fills_blank_fields_only() {
        let run = RunConfig {
            topic: "  Remote Work ".into(),
            tone: String::new(),
            language: "German".into(),
            word_count: 0,
            current_year: String::new(),
            ..RunConfig::default()
        }
        .normalized();

        assert_eq!(run.topic, "Remote Work");
        assert_eq!(run.tone, "professional");
        assert_eq!(run.language, "German");
        assert_eq!(run.word_count, 1200);
        assert!(!run.current_year.is_empty());
    }

    #[test]
    fn brief_from_toml_keeps_unset_defaults() {
        let brief: RunConfig = toml::from_str(
            r#"
topic = "Remote Work"
word_count = 500
blog_length = "short"
faq = true
"#,
        )
        .expect("parse brief");
        assert_eq!(brief.topic, "Remote Work");
        assert_eq!(brief.word_count, 500);
        assert_eq!(brief.blog_length, LengthTier::Short);
        assert!(brief.faq);
        assert_eq!(brief.tone, "professional");
    }

    #[test]
    fn load_brief_reads_json() {
        let path = std::env::temp_dir().join(format!("bs-brief-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, r#"{"topic": "Nike Shoes", "has_product": true}"#).unwrap();

        let brief = load_brief(&path, DEFAULT_WORD_COUNT).expect("load brief");
        assert_eq!(brief.topic, "Nike Shoes");
        assert!(brief.has_product);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_brief_uses_default_word_count_only_when_unset() {
        let unset = std::env::temp_dir().join(format!("bs-brief-{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&unset, "topic = \"Remote Work\"\n").unwrap();
        assert_eq!(load_brief(&unset, 900).expect("load brief").word_count, 900);

        let set = std::env::temp_dir().join(format!("bs-brief-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&set, r#"{"topic": "Remote Work", "word_count": 1200}"#).unwrap();
        assert_eq!(load_brief(&set, 900).expect("load brief").word_count, 1200);

        let _ = std::fs::remove_file(&unset);
        let _ = std::fs::remove_file(&set);
    }

    #[test]
    fn explicit_title_ignores_whitespace() {
        let mut run = RunConfig::default();
        assert_eq!(run.explicit_title(), None);
        run.title = "  ".into();
        assert_eq!(run.explicit_title(), None);
        run.title = "My Title".into();
        assert_eq!(run.explicit_title(), Some("My Title"));
    }

    #[test]
    fn enum_settings_parse() {
        assert_eq!("SEO".parse::<ProofreadSource>().unwrap(), ProofreadSource::Seo);
        assert!("final".parse::<ProofreadSource>().is_err());
        assert_eq!("long".parse::<LengthTier>().unwrap(), LengthTier::Long);
        assert!("huge".parse::<LengthTier>().is_err());
    }

    #[test]
    fn env_secret_treats_missing_as_absent() {
        // Use a unique env var name to avoid interfering with other tests
        assert!(env_secret("BS_TEST_NONEXISTENT_KEY_12345").is_none());
    }
}
