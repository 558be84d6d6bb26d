use tracing::instrument;

use blogsmith_completion::Completer;
use blogsmith_shared::{StageName, StageOutput};

/// Role instructions for the SEO stage.
pub const SEO_CHECKER_ROLE: &str = "You are an SEO expert who optimizes content for search \
engines while keeping it readable and engaging for people. You improve keyword placement, \
heading structure and technical SEO elements without keyword stuffing.";

/// Reviews a draft against target keywords.
pub struct SeoChecker {
    completer: Completer,
}

impl SeoChecker {
    pub fn new(completer: Completer) -> Self {
        Self { completer }
    }

    /// Returns the optimizations made plus a revised post with a meta description.
    #[instrument(skip_all, fields(draft_chars = draft.len()))]
    pub async fn run(&self, draft: &str, keywords: &str) -> StageOutput {
        let prompt = format!(
            "Review the following blog draft and optimize it for the target keywords while \
keeping it readable and engaging.\n\n\
Blog Draft:\n{draft}\n\n\
Target Keywords:\n{keywords}\n\n\
Provide:\n\
1. SEO Optimizations Made: keyword integration, title and heading changes, a meta description \
suggestion, internal linking opportunities and structure improvements.\n\
2. Optimized Blog Post: the full revised post with better keyword integration, H1/H2/H3 \
headings optimized for search, natural language preserved, and the meta description at the \
end.\n\n\
SEO Analysis and Improved Blog Post:\n",
            keywords = crate::or_none(keywords),
        );

        self.completer
            .complete(StageName::SeoChecker.error_context(), SEO_CHECKER_ROLE, &prompt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Recorder, completer};

    #[tokio::test]
    async fn draft_and_keywords_reach_prompt() {
        let recorder = Recorder::replying("optimized");
        let checker = SeoChecker::new(completer(&recorder));

        let out = checker.run("# Draft\nbody", "• remote jobs").await;
        assert_eq!(out.text, "optimized");

        let prompt = recorder.last_prompt();
        assert!(prompt.contains("# Draft\nbody"));
        assert!(prompt.contains("• remote jobs"));
        assert!(prompt.contains("meta description"));
        assert_eq!(recorder.last_instructions(), SEO_CHECKER_ROLE);
    }

    #[tokio::test]
    async fn degraded_draft_passes_through_as_content() {
        let recorder = Recorder::replying("optimized");
        let checker = SeoChecker::new(completer(&recorder));

        checker.run("[OpenAI API key missing]", "").await;
        let prompt = recorder.last_prompt();
        assert!(prompt.contains("[OpenAI API key missing]"));
        assert!(prompt.contains("Target Keywords:\n(none)"));
    }
}
