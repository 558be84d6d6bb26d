use tracing::instrument;

use blogsmith_completion::Completer;
use blogsmith_shared::{StageName, StageOutput};

/// Role instructions for the final editing stage.
pub const PROOFREADER_ROLE: &str = "You are a professional blog editor and SEO specialist. \
You correct grammar, punctuation and typos, smooth transitions, break up dense text, keep \
headings clean and professional, integrate keywords without stuffing, and include a clear call \
to action. You never change the title, you keep the content original and human-sounding, and \
you treat the requested word count as a hard constraint. Output the finished post in Markdown.";

/// Phrases the editor must rewrite or delete.
pub const FORBIDDEN_PHRASES: [&str; 6] = [
    "has/have emerged",
    "In today's... world",
    "In this age of...",
    "when it comes to",
    "your premier destination",
    "whether you...",
];

/// Words the editor must replace or remove.
pub const FORBIDDEN_WORDS: [&str; 7] = [
    "tailored",
    "vibrant",
    "cutting-edge",
    "solutions",
    "unique",
    "landscape",
    "comprehensive",
];

/// Allowed deviation from the target word count.
const WORD_TOLERANCE: u32 = 5;

/// Polishes text for publication.
pub struct Proofreader {
    completer: Completer,
}

impl Proofreader {
    pub fn new(completer: Completer) -> Self {
        Self { completer }
    }

    /// `url`, when non-empty, is where the call to action should point.
    #[instrument(skip_all, fields(word_count = word_count, audience = %audience))]
    pub async fn run(&self, draft: &str, word_count: u32, audience: &str, url: &str) -> StageOutput {
        let prompt = proofread_prompt(draft, word_count, audience, url);
        self.completer
            .complete(StageName::Proofreader.error_context(), PROOFREADER_ROLE, &prompt)
            .await
    }
}

fn quoted(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn proofread_prompt(draft: &str, word_count: u32, audience: &str, url: &str) -> String {
    let cta = match url.trim() {
        "" => "Include a compelling call to action.".to_string(),
        url => format!("Include a compelling call to action linking to {url}."),
    };

    format!(
        "Proofread and polish the draft blog post below for publication. The result must be \
publication-ready.\n\n\
Draft Blog Content:\n{draft}\n\n\
Constraints:\n\
- Preserve the section structure and headings.\n\
- Do not add new content.\n\
- Length: {word_count} words, no more than {WORD_TOLERANCE} words above or below.\n\
- Match a writing style suited to a {audience} audience.\n\n\
Editing rules:\n\
1. Correct grammar, punctuation, spelling and awkward phrasing.\n\
2. Improve clarity and flow without changing the meaning.\n\
3. Keep SEO keyword usage; do not overuse.\n\
4. Keep product references neutral and factual, not promotional.\n\
5. Remove filler, cliches and generic AI phrasing.\n\n\
Style guide (rewrite or delete):\n\
- Forbidden phrases: {phrases}.\n\
- Forbidden language: self-referential lines (\"we pride ourselves\") and imperative openers \
(\"Discover\", \"Explore\").\n\
- Words to replace or remove: {words}.\n\n\
{cta}\n\n\
Provide only the final polished blog post:\n",
        phrases = quoted(&FORBIDDEN_PHRASES),
        words = quoted(&FORBIDDEN_WORDS),
    )
}
