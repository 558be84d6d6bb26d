//! Shared types, error model, and configuration for Blogsmith.
//!
//! This crate is the foundation depended on by all other Blogsmith crates.
//! It provides:
//! - [`BlogsmithError`]: the unified error type
//! - Domain types ([`StageOutput`], [`StageName`], [`OutlineKind`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompletionConfig, DEFAULT_WORD_COUNT, DefaultsConfig, KeywordsConfig, LengthTier,
    ProofreadSource, RunConfig, SearchConfig, config_dir, config_file_path, current_year,
    env_secret, init_config, load_brief, load_config, load_config_from,
};
pub use error::{BlogsmithError, Result};
pub use types::{Failure, FailureKind, OutlineKind, RunId, StageName, StageOutput, StageStatus};
