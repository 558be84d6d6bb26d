use std::sync::Arc;

use tracing::{debug, instrument};

use blogsmith_completion::Completer;
use blogsmith_providers::{SearchProvider, format_search_results};
use blogsmith_shared::{StageName, StageOutput};

/// Role instructions for the trend stage.
pub const TREND_RESEARCHER_ROLE: &str = "You are a blog trend analyst. You identify what is \
currently trending in an industry and the angles, hooks and formats that make content timely \
and engaging. You answer with strict JSON when asked to.";

const TREND_RESULTS: usize = 5;

/// Summarizes trending content and proposes titles, as a JSON object.
pub struct TrendResearcher {
    completer: Completer,
    search: Option<Arc<dyn SearchProvider>>,
}

impl TrendResearcher {
    pub fn new(completer: Completer) -> Self {
        Self {
            completer,
            search: None,
        }
    }

    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    /// Expected reply: `{"summary": "...", "blog_titles": ["...", ...]}`.
    #[instrument(skip_all, fields(topic = %topic, year = %year))]
    pub async fn run(&self, topic: &str, keywords: &str, year: &str, language: &str) -> StageOutput {
        let query = trend_query(topic, year);
        let evidence = match &self.search {
            Some(provider) => {
                let records = provider.search(&query, TREND_RESULTS).await;
                debug!(records = records.len(), "trend results gathered");
                Some(format_search_results(&records))
            }
            None => None,
        };

        let prompt = trend_prompt(topic, keywords, year, language, &query, evidence.as_deref());
        self.completer
            .complete(
                StageName::TrendResearcher.error_context(),
                TREND_RESEARCHER_ROLE,
                &prompt,
            )
            .await
    }
}

/// The single natural-language search used for trend discovery.
pub fn trend_query(topic: &str, year: &str) -> String {
    format!("Current trending blog topics about {topic} in {year}")
}

fn trend_prompt(
    topic: &str,
    keywords: &str,
    year: &str,
    language: &str,
    query: &str,
    evidence: Option<&str>,
) -> String {
    let sources = match evidence {
        Some(results) => format!("Search results for \"{query}\":\n{results}\n\n"),
        None => format!(
            "No live search is available. Work from what you know about \"{query}\".\n\n"
        ),
    };

    format!(
        "You are researching blog trends for {year} around \"{topic}\".\n\
Relevant keywords:\n{keywords}\n\n\
{sources}\
Based on this:\n\
- Summarize the most recent trending blog content, focusing on emerging keywords, styles and \
angles.\n\
- Identify the most popular blog formats (listicles, how-to guides, case studies, tutorials, \
multimedia-heavy posts).\n\
- Highlight the subtopics, content angles and themes that dominate the space.\n\
- Keep the summary detailed, insightful and actionable for SEO-driven planning.\n\n\
Output exactly this JSON object and nothing else (no markdown, no code fences, no commentary):\n\
{{\n  \"summary\": \"Detailed paragraph covering trending content, top formats and standout \
themes.\",\n  \"blog_titles\": [\"six compelling, SEO-friendly titles, each using a keyword\"]\n}}\n\n\
Write exactly six blog_titles in {language}, each directly incorporating one of the keywords.\n",
        keywords = crate::or_none(keywords),
    )
}
