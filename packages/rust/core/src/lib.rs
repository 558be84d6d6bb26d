//! Pipeline orchestration and post-processing for Blogsmith.
//!
//! This crate ties the stage agents together into the end-to-end
//! [`create_blog`](pipeline::create_blog) workflow, and owns the pieces of
//! the run that are not model calls: outline repair, trend parsing and the
//! final file write.

pub mod artifact;
pub mod outline;
pub mod pipeline;
pub mod trends;

pub use artifact::{ArtifactOptions, ArtifactRecord, blog_path, sanitize_topic, tidy_markdown, write_blog};
pub use outline::{filter_outline, prepare_outline, recover_json_array};
pub use pipeline::{
    Agents, BlogRun, PipelineOptions, ProgressReporter, SilentProgress, StageRecord, create_blog,
};
pub use trends::TrendReport;
