//! Completion service adapter.
//!
//! Stage agents talk to the language model only through [`Completer`], which
//! wraps any [`CompletionBackend`] and guarantees that a call never fails:
//! backend errors come back as a degraded [`StageOutput`] carrying the
//! bracketed sentinel text.

mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use blogsmith_shared::{BlogsmithError, FailureKind, Result, StageOutput};

pub use openai::{OPENAI_CREDENTIAL, OpenAiBackend};

/// A text-generation backend: role instructions plus a prompt in, text out.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion. May fail; [`Completer`] absorbs the failure.
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String>;
}

/// Never-failing front door to a [`CompletionBackend`].
#[derive(Clone)]
pub struct Completer {
    backend: Arc<dyn CompletionBackend>,
}

impl Completer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Convenience constructor taking the backend by value.
    pub fn from_backend(backend: impl CompletionBackend + 'static) -> Self {
        Self::new(Arc::new(backend))
    }

    /// Run one completion.
    ///
    /// `context` names the caller and appears in the sentinel text of a
    /// degraded result, e.g. `[Error in Writer agent: ...]`.
    #[instrument(skip_all, fields(context = %context, prompt_chars = prompt.len()))]
    pub async fn complete(&self, context: &str, instructions: &str, prompt: &str) -> StageOutput {
        match self.backend.complete(instructions, prompt).await {
            Ok(text) => {
                debug!(output_chars = text.len(), "completion succeeded");
                StageOutput::ok(text)
            }
            Err(BlogsmithError::MissingCredential { name }) => {
                warn!(credential = %name, "completion skipped, credential missing");
                StageOutput::degraded(FailureKind::CredentialMissing, context, name)
            }
            Err(e) => {
                warn!(error = %e, "completion failed");
                StageOutput::degraded(e.failure_kind(), context, e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Completer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completer").finish_non_exhaustive()
    }
}
