use std::sync::Arc;

use tracing::{debug, instrument, warn};

use blogsmith_completion::Completer;
use blogsmith_providers::{
    KeywordIdeasProvider, NO_KEYWORD_RESULTS, format_for_researcher, search_keywords,
};
use blogsmith_shared::{StageName, StageOutput};

/// Role instructions shared by both keyword calls.
pub const KEYWORD_RESEARCHER_ROLE: &str = "You are an SEO keyword research expert. You find the \
keywords and key phrases that help content rank: primary keywords, long-tail variations and \
closely related terms. You return clean lists with no commentary.";

/// Two-phase keyword research: seed generation, then expansion.
pub struct KeywordResearcher {
    completer: Completer,
    ideas: Option<Arc<dyn KeywordIdeasProvider>>,
    location: String,
}

impl KeywordResearcher {
    pub fn new(completer: Completer) -> Self {
        Self {
            completer,
            ideas: None,
            location: String::new(),
        }
    }

    /// Expand seeds through a keyword-ideas provider targeting `location`.
    pub fn with_ideas(mut self, provider: Arc<dyn KeywordIdeasProvider>, location: &str) -> Self {
        self.ideas = Some(provider);
        self.location = location.to_string();
        self
    }

    /// Ask the model for five seed keywords as a bullet list.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn generate_seed_keywords(
        &self,
        topic: &str,
        tone: &str,
        language: &str,
        keywords: &str,
    ) -> StageOutput {
        let prompt = seed_prompt(topic, tone, language, keywords);
        self.completer
            .complete(
                StageName::KeywordSeeds.error_context(),
                KEYWORD_RESEARCHER_ROLE,
                &prompt,
            )
            .await
    }

    /// Expand `seed_keywords` into 10-15 SEO keywords.
    ///
    /// With a provider, the prompt carries the provider's idea texts. When
    /// the provider is absent or returns nothing usable, the model works from
    /// the topic and seeds alone.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn run(
        &self,
        topic: &str,
        seed_keywords: &str,
        tone: &str,
        language: &str,
    ) -> StageOutput {
        let ideas = self.provider_ideas(topic, seed_keywords).await;
        let prompt = match ideas {
            Some(ideas) => expansion_prompt(topic, seed_keywords, tone, language, &ideas),
            None => fallback_prompt(topic, seed_keywords, tone, language),
        };
        self.completer
            .complete(
                StageName::KeywordResearcher.error_context(),
                KEYWORD_RESEARCHER_ROLE,
                &prompt,
            )
            .await
    }

    async fn provider_ideas(&self, topic: &str, seed_keywords: &str) -> Option<String> {
        let provider = self.ideas.as_ref()?;
        let seeds = parse_seed_list(seed_keywords).join(", ");

        match search_keywords(provider.as_ref(), topic, "", &seeds, &self.location).await {
            Ok(records) => {
                let formatted = format_for_researcher(&records);
                if formatted == NO_KEYWORD_RESULTS {
                    debug!("keyword provider returned nothing usable");
                    None
                } else {
                    Some(formatted)
                }
            }
            Err(e) => {
                warn!(error = %e, "keyword query rejected");
                None
            }
        }
    }
}

/// Turn a model-written bullet or numbered list into bare keywords.
///
/// Sentinel lines (starting with `[`) and blank lines are skipped; bullet
/// markers, numbering, emphasis and quotes are stripped.
pub fn parse_seed_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .map(|line| {
            let line = line.trim_start_matches(['-', '*', '•', '+']).trim_start();
            let line = match line.split_once(['.', ')']) {
                Some((num, rest))
                    if !num.is_empty()
                        && num.chars().all(|c| c.is_ascii_digit())
                        && rest.starts_with(char::is_whitespace) =>
                {
                    rest.trim_start()
                }
                _ => line,
            };
            line.trim_matches(['*', '"', '\'', '`']).trim().to_string()
        })
        .filter(|kw| !kw.is_empty())
        .collect()
}

fn seed_prompt(topic: &str, tone: &str, language: &str, keywords: &str) -> String {
    let mut prompt = format!(
        "Analyze the topic \"{topic}\" and generate an initial set of relevant seed keywords.\n\
These keywords should be closely related to the topic and suitable for further keyword \
expansion.\nKeep the {tone} tone and the {language} language in mind so the keywords fit the \
audience.\n"
    );
    if !keywords.trim().is_empty() {
        prompt.push_str(&format!("Build on these user-supplied keywords: {keywords}\n"));
    }
    prompt.push_str(
        "\nExpected Output:\n\
A clean bullet point list of 5 seed keywords or keyphrases directly related to the topic, with \
no extra commentary or formatting.\n",
    );
    prompt
}

fn expansion_prompt(topic: &str, seeds: &str, tone: &str, language: &str, ideas: &str) -> String {
    format!(
        "Execute keyword research to support the SEO strategy of a blog post about \"{topic}\".\n\
Seed keywords:\n{seeds}\n\n\
Consider the {tone} tone and the {language} language for contextual relevance.\n\
The keyword idea tool returned the following raw ideas:\n{ideas}\n\n\
Your task is strictly to extract keywords from the tool output without modification.\n\n\
Expected Output:\n\
A clean list of 10-15 SEO-friendly keywords or keyphrases, exactly as the tool returned them, \
formatted as a bullet point list with no commentary, explanation or transformation.\n",
        seeds = crate::or_none(seeds),
    )
}

fn fallback_prompt(topic: &str, seeds: &str, tone: &str, language: &str) -> String {
    format!(
        "Execute keyword research to support the SEO strategy of a blog post about \"{topic}\".\n\
Seed keywords:\n{seeds}\n\n\
Consider the {tone} tone and the {language} language for contextual relevance.\n\
Expand the seeds with long-tail variations, question-style queries and closely related terms \
that people actually search for.\n\n\
Expected Output:\n\
A clean list of 10-15 SEO-friendly keywords or keyphrases, formatted as a bullet point list \
with no commentary or explanation.\n",
        seeds = crate::or_none(seeds),
    )
}
