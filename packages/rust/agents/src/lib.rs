//! The seven stage agents of the blog pipeline.
//!
//! Every agent follows the same shape: optionally call a provider and format
//! what it returns, interpolate the inputs into a fixed prompt template, run
//! one completion with the agent's role instructions, and hand the result
//! back untouched. Primary operations return [`StageOutput`] and never fail;
//! checking the shape of model output is the orchestrator's job.
//!
//! [`StageOutput`]: blogsmith_shared::StageOutput

pub mod keyword_researcher;
pub mod outline_creator;
pub mod proofreader;
pub mod researcher;
pub mod seo_checker;
pub mod trend_researcher;
pub mod writer;

pub use keyword_researcher::{KEYWORD_RESEARCHER_ROLE, KeywordResearcher, parse_seed_list};
pub use outline_creator::{OUTLINE_CREATOR_ROLE, OutlineCreator, OutlineRequest, ProductBrief};
pub use proofreader::{FORBIDDEN_PHRASES, FORBIDDEN_WORDS, PROOFREADER_ROLE, Proofreader};
pub use researcher::{RESEARCHER_ROLE, Researcher};
pub use seo_checker::{SEO_CHECKER_ROLE, SeoChecker};
pub use trend_researcher::{TREND_RESEARCHER_ROLE, TrendResearcher, trend_query};
pub use writer::{WRITER_ROLE, Writer, WriterRequest, word_range};

/// Stand-in for an empty prompt input, so templates never show a blank slot.
pub(crate) fn or_none(text: &str) -> &str {
    if text.trim().is_empty() { "(none)" } else { text }
}
