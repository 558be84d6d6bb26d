//! Core domain types for a Blogsmith run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// StageName
// ---------------------------------------------------------------------------

/// Every completion call the pipeline makes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Researcher,
    KeywordSeeds,
    KeywordResearcher,
    TrendResearcher,
    OutlineCreator,
    Writer,
    SeoChecker,
    Proofreader,
}

impl StageName {
    /// All stages in pipeline order.
    pub const ALL: [StageName; 8] = [
        Self::Researcher,
        Self::KeywordSeeds,
        Self::KeywordResearcher,
        Self::TrendResearcher,
        Self::OutlineCreator,
        Self::Writer,
        Self::SeoChecker,
        Self::Proofreader,
    ];

    /// Stable snake_case identifier used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Researcher => "researcher",
            Self::KeywordSeeds => "keyword_seeds",
            Self::KeywordResearcher => "keyword_researcher",
            Self::TrendResearcher => "trend_researcher",
            Self::OutlineCreator => "outline_creator",
            Self::Writer => "writer",
            Self::SeoChecker => "seo_checker",
            Self::Proofreader => "proofreader",
        }
    }

    /// Label used inside sentinel strings, e.g. `[Error in Writer agent: ...]`.
    pub fn error_context(&self) -> &'static str {
        match self {
            Self::Researcher => "Researcher agent",
            Self::KeywordSeeds => "KeywordResearcher seed generation",
            Self::KeywordResearcher => "KeywordResearcher agent",
            Self::TrendResearcher => "BlogTrendResearcher agent",
            Self::OutlineCreator => "OutlineCreator agent",
            Self::Writer => "Writer agent",
            Self::SeoChecker => "SEOChecker agent",
            Self::Proofreader => "Proofreader agent",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StageOutput
// ---------------------------------------------------------------------------

/// Why a stage produced degraded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required credential was absent; no call was attempted.
    CredentialMissing,
    /// Network or remote-service failure.
    Transport,
    /// The service answered with something unusable.
    MalformedResponse,
}

/// A degraded stage result: what went wrong, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Ok vs. degraded, as a typed field rather than a string prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    Degraded(Failure),
}

/// Text produced by one stage.
///
/// A degraded output still carries text: the bracketed sentinel that flows
/// downstream into later prompts exactly like normal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    pub text: String,
    pub status: StageStatus,
}

impl StageOutput {
    /// A successful stage result.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StageStatus::Ok,
        }
    }

    /// A degraded result whose text is the sentinel for `kind`.
    ///
    /// Missing credentials render as `[<message> missing]`, everything else
    /// as `[Error in <context>: <message>]`.
    pub fn degraded(kind: FailureKind, context: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let text = match kind {
            FailureKind::CredentialMissing => format!("[{message} missing]"),
            _ => format!("[Error in {context}: {message}]"),
        };
        Self {
            text,
            status: StageStatus::Degraded(Failure { kind, message }),
        }
    }

    /// Whether this output is a sentinel rather than model text.
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, StageStatus::Degraded(_))
    }

    /// The failure, if degraded.
    pub fn failure(&self) -> Option<&Failure> {
        match &self.status {
            StageStatus::Degraded(failure) => Some(failure),
            StageStatus::Ok => None,
        }
    }
}

impl std::fmt::Display for StageOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// OutlineKind
// ---------------------------------------------------------------------------

/// The three outline item shapes.
///
/// Shapes are marked by key presence only: `title` for a section, `faq` for
/// a FAQ block, `product_title` for a product block. One item may carry
/// several marker keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Section,
    Faq,
    Product,
}

impl OutlineKind {
    /// The key whose presence marks this shape.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Section => "title",
            Self::Faq => "faq",
            Self::Product => "product_title",
        }
    }

    /// Whether `item` is an object carrying this shape's marker key.
    pub fn marks(&self, item: &serde_json::Value) -> bool {
        item.as_object()
            .is_some_and(|obj| obj.contains_key(self.key()))
    }
}
