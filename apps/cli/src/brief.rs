//! Turning `write` flags (and an optional brief file) into a [`RunConfig`].

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, eyre};

use blogsmith_core::PipelineOptions;
use blogsmith_shared::{DefaultsConfig, LengthTier, ProofreadSource, RunConfig, load_brief};

/// Topic, keywords and word count of the built-in demo run.
pub(crate) const DEMO_TOPIC: &str = "The Benefits of Remote Work";
pub(crate) const DEMO_KEYWORDS: &str = "remote work, benefits of remote work, work from home";
pub(crate) const DEMO_WORD_COUNT: u32 = 2000;

/// Brief fields accepted on the command line. Each one overrides the
/// brief file when both are given.
#[derive(Args, Debug, Default)]
pub(crate) struct BriefArgs {
    /// TOML or JSON brief file with any subset of run fields.
    #[arg(long)]
    pub brief: Option<PathBuf>,

    /// Blog topic.
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Comma-separated target keywords.
    #[arg(short, long)]
    pub keywords: Option<String>,

    #[arg(long)]
    pub tone: Option<String>,

    #[arg(long)]
    pub language: Option<String>,

    /// Year the trend research is anchored to.
    #[arg(long)]
    pub year: Option<String>,

    #[arg(long)]
    pub audience: Option<String>,

    /// Target word count.
    #[arg(short = 'w', long)]
    pub word_count: Option<u32>,

    /// Length tier: short, medium or long.
    #[arg(long)]
    pub length: Option<LengthTier>,

    /// Keywords the draft must contain.
    #[arg(long)]
    pub include_keywords: Option<String>,

    /// Keywords the draft must not contain.
    #[arg(long)]
    pub avoid_keywords: Option<String>,

    /// Search intent, e.g. inform or sell.
    #[arg(long)]
    pub intent: Option<String>,

    /// Use this title instead of one suggested by trend research.
    #[arg(long)]
    pub title: Option<String>,

    /// Call-to-action link for the proofread post.
    #[arg(long)]
    pub url: Option<String>,

    /// Include an FAQ block.
    #[arg(long)]
    pub faq: bool,

    /// Include a product block (needs at least one product field).
    #[arg(long)]
    pub product: bool,

    #[arg(long)]
    pub product_name: Option<String>,

    #[arg(long)]
    pub product_url: Option<String>,

    #[arg(long)]
    pub product_image_url: Option<String>,

    #[arg(long)]
    pub product_description: Option<String>,

    #[arg(long)]
    pub product_price_min: Option<String>,

    #[arg(long)]
    pub product_price_max: Option<String>,

    #[arg(long)]
    pub product_currency: Option<String>,
}

/// Pipeline switches shared by `write` and `demo`.
#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Directory the post is written to.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Text the proofreader edits: draft or seo.
    #[arg(long)]
    pub proofread: Option<ProofreadSource>,

    /// Stop at the first degraded stage.
    #[arg(long)]
    pub strict: bool,

    /// Prefix the file with a `# <topic>` heading when it has none.
    #[arg(long)]
    pub heading: bool,

    /// Normalize the Markdown (wrapping fence, extra H1s, blank runs) before writing.
    #[arg(long)]
    pub tidy: bool,

    /// Skip news results during research.
    #[arg(long)]
    pub no_news: bool,

    /// Run without search or keyword-ideas providers.
    #[arg(long)]
    pub offline: bool,
}

impl BriefArgs {
    /// Resolve the run: defaults, then the brief file, then flags.
    pub(crate) fn resolve(&self, defaults: &DefaultsConfig) -> Result<RunConfig> {
        let mut run = match &self.brief {
            Some(path) => load_brief(path, defaults.word_count)?,
            None => RunConfig {
                word_count: defaults.word_count,
                ..RunConfig::default()
            },
        };

        overlay(&mut run.topic, &self.topic);
        overlay(&mut run.keywords, &self.keywords);
        overlay(&mut run.tone, &self.tone);
        overlay(&mut run.language, &self.language);
        overlay(&mut run.current_year, &self.year);
        overlay(&mut run.audience, &self.audience);
        overlay(&mut run.include_keywords, &self.include_keywords);
        overlay(&mut run.avoid_keywords, &self.avoid_keywords);
        overlay(&mut run.intent, &self.intent);
        overlay(&mut run.title, &self.title);
        overlay(&mut run.url, &self.url);
        overlay(&mut run.product_name, &self.product_name);
        overlay(&mut run.product_url, &self.product_url);
        overlay(&mut run.product_image_url, &self.product_image_url);
        overlay(&mut run.product_description_text, &self.product_description);
        overlay(&mut run.product_price_min, &self.product_price_min);
        overlay(&mut run.product_price_max, &self.product_price_max);
        overlay(&mut run.product_currency, &self.product_currency);

        if let Some(word_count) = self.word_count {
            run.word_count = word_count;
        }
        if let Some(length) = self.length {
            run.blog_length = length;
        }
        run.faq |= self.faq;
        run.has_product |= self.product;

        let run = run.normalized();
        if run.topic.is_empty() {
            return Err(eyre!("a topic is required: pass --topic or set it in --brief"));
        }
        Ok(run)
    }
}

impl OutputArgs {
    /// Pipeline options from config defaults with these flags applied.
    pub(crate) fn resolve(&self, defaults: &DefaultsConfig) -> PipelineOptions {
        let mut options = PipelineOptions::from_defaults(defaults);
        if let Some(out) = &self.out {
            options.artifact.output_dir = out.clone();
        }
        if let Some(source) = self.proofread {
            options.proofread_source = source;
        }
        options.strict |= self.strict;
        options.artifact.include_heading |= self.heading;
        options.artifact.tidy |= self.tidy;
        if self.no_news {
            options.include_news = false;
        }
        options
    }
}

/// The fixed brief behind `blogsmith demo`.
pub(crate) fn demo_brief() -> RunConfig {
    RunConfig {
        topic: DEMO_TOPIC.into(),
        keywords: DEMO_KEYWORDS.into(),
        word_count: DEMO_WORD_COUNT,
        faq: true,
        ..RunConfig::default()
    }
}

fn overlay(slot: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}
