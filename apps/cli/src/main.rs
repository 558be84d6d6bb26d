//! Blogsmith CLI: research, outline, draft and polish a blog post with an LLM.
//!
//! Each run walks a fixed sequence of model calls (research, keywords,
//! trends, outline, draft, SEO review, proofread) and writes the result
//! as Markdown.

mod brief;
mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::report_dotenv(dotenv);
    commands::run(cli).await
}
