use tracing::instrument;

use blogsmith_completion::Completer;
use blogsmith_shared::{LengthTier, StageName, StageOutput};

use crate::outline_creator::ProductBrief;

/// Role instructions for the drafting stage.
pub const WRITER_ROLE: &str = "You are a professional blog writer. You turn outlines and \
research into engaging, informative posts with clear structure and smooth flow, written in \
Markdown with proper headings.";

/// Inputs for [`Writer::run`].
#[derive(Debug, Clone, Copy)]
pub struct WriterRequest<'a> {
    pub outline: &'a str,
    pub research: &'a str,
    pub keywords: &'a str,
    pub trend_summary: &'a str,
    pub tone: &'a str,
    pub language: &'a str,
    pub word_count: u32,
    pub blog_length: LengthTier,
    pub include_keywords: &'a str,
    pub avoid_keywords: &'a str,
    pub intent: &'a str,
    /// Resolved title; empty lets the model choose.
    pub title: &'a str,
    pub product: Option<ProductBrief<'a>>,
}

/// Drafts the full post from the outline.
pub struct Writer {
    completer: Completer,
}

impl Writer {
    pub fn new(completer: Completer) -> Self {
        Self { completer }
    }

    #[instrument(skip_all, fields(word_count = request.word_count, length = %request.blog_length))]
    pub async fn run(&self, request: WriterRequest<'_>) -> StageOutput {
        let prompt = writer_prompt(&request);
        self.completer
            .complete(StageName::Writer.error_context(), WRITER_ROLE, &prompt)
            .await
    }
}

/// Accepted word range: the target ±5%, at least ±1 word.
pub fn word_range(word_count: u32) -> (u32, u32) {
    let slack = (word_count / 20).max(1);
    (word_count.saturating_sub(slack), word_count.saturating_add(slack))
}

fn writer_prompt(request: &WriterRequest<'_>) -> String {
    let (low, high) = word_range(request.word_count);

    let mut prompt = format!(
        "Write a complete blog post in {language} following the outline below.\n\n\
Blog Outline:\n{outline}\n\n\
Research Information:\n{research}\n\n\
SEO Keywords:\n{keywords}\n\n\
Trend Insights:\n{trends}\n\n",
        language = request.language,
        outline = crate::or_none(request.outline),
        research = crate::or_none(request.research),
        keywords = crate::or_none(request.keywords),
        trends = crate::or_none(request.trend_summary),
    );

    match request.title.trim() {
        "" => prompt.push_str("Title: write a compelling, SEO-friendly H1 title.\n"),
        title => prompt.push_str(&format!("Title: use exactly \"{title}\" as the H1 title.\n")),
    }

    if let Some(product) = &request.product {
        prompt.push_str(&format!(
            "Featured product (describe it factually, not promotionally):\n{}\n",
            product.render()
        ));
    }

    prompt.push_str(&format!(
        "\nWriting rules:\n\
1. Tone: {tone}. Purpose: {intent}.\n\
2. Preserve every heading of the outline, in order, as Markdown headings.\n\
3. Expand each section into detailed, informative paragraphs and weave the research in \
naturally.\n\
4. Use the SEO keywords naturally; never stuff them.\n\
5. Length: a {length} post of {target} words, staying between {low} and {high} words.\n\
6. Use smooth transitions and make the content actionable.\n",
        tone = request.tone,
        intent = request.intent,
        length = request.blog_length,
        target = request.word_count,
    ));

    if !request.include_keywords.trim().is_empty() {
        prompt.push_str(&format!(
            "7. Include each of these keywords at least once: {}\n",
            request.include_keywords.trim()
        ));
    }
    if !request.avoid_keywords.trim().is_empty() {
        prompt.push_str(&format!(
            "8. Never use these words or phrases: {}\n",
            request.avoid_keywords.trim()
        ));
    }

    prompt.push_str("\nWrite the complete blog post now in Markdown:\n");
    prompt
}
