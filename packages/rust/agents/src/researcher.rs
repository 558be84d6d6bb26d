use std::sync::Arc;

use tracing::{debug, instrument};

use blogsmith_completion::Completer;
use blogsmith_providers::{SearchProvider, format_search_results};
use blogsmith_shared::{StageName, StageOutput};

/// Role instructions for the research stage.
pub const RESEARCHER_ROLE: &str = "You are a research assistant who gathers accurate, current \
information on blog topics. Summarize the facts, statistics and insights that matter most for \
writing a high-quality blog post, and prefer verifiable data over opinion.";

const WEB_RESULTS: usize = 5;
const NEWS_RESULTS: usize = 3;

/// Summarizes facts, statistics and trends about a topic.
pub struct Researcher {
    completer: Completer,
    search: Option<Arc<dyn SearchProvider>>,
}

impl Researcher {
    pub fn new(completer: Completer) -> Self {
        Self {
            completer,
            search: None,
        }
    }

    /// Ground the prompt in live web (and optionally news) results.
    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    #[instrument(skip_all, fields(topic = %topic, include_news = include_news))]
    pub async fn run(&self, topic: &str, keywords: &str, include_news: bool) -> StageOutput {
        let evidence = self.gather(topic, keywords, include_news).await;
        let prompt = research_prompt(topic, keywords, evidence.as_deref());
        self.completer
            .complete(StageName::Researcher.error_context(), RESEARCHER_ROLE, &prompt)
            .await
    }

    /// Web results only, no keyword hint.
    pub async fn quick_research(&self, topic: &str) -> StageOutput {
        self.run(topic, "", false).await
    }

    async fn gather(&self, topic: &str, keywords: &str, include_news: bool) -> Option<String> {
        let provider = self.search.as_ref()?;

        let query = match keywords.trim() {
            "" => topic.to_string(),
            kw => format!("{topic} {kw}"),
        };

        let web = provider.search(&query, WEB_RESULTS).await;
        debug!(records = web.len(), "web results gathered");
        let mut sections = vec![format_search_results(&web)];

        if include_news {
            let news = provider.search_news(topic, NEWS_RESULTS).await;
            debug!(records = news.len(), "news results gathered");
            sections.push(format!("Recent news:\n{}", format_search_results(&news)));
        }

        Some(sections.join("\n\n"))
    }
}

fn research_prompt(topic: &str, keywords: &str, evidence: Option<&str>) -> String {
    let mut prompt = format!(
        "Research the following blog topic in detail and provide a concise summary of the most \
important facts, statistics, and insights.\n\nTopic: {topic}\n"
    );

    if !keywords.trim().is_empty() {
        prompt.push_str(&format!("Focus keywords: {keywords}\n"));
    }

    if let Some(evidence) = evidence {
        prompt.push_str(&format!(
            "\nUse these search results as your primary sources and cite figures from them \
where relevant:\n\n{evidence}\n"
        ));
    }

    prompt.push_str(
        "\nPlease provide:\n\
1. Key facts and current information about this topic\n\
2. Relevant statistics and data points\n\
3. Important insights and trends\n\
4. Any notable developments or changes in this area\n\n\
Summary:\n",
    );
    prompt
}
