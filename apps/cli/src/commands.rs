//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use blogsmith_completion::{Completer, OpenAiBackend};
use blogsmith_core::{Agents, BlogRun, PipelineOptions, ProgressReporter, create_blog};
use blogsmith_providers::{
    GoogleAdsCredentials, GoogleAdsKeywordIdeas, KeywordIdeasProvider, SUPPORTED_LOCATIONS,
    SearchProvider, SerperSearch,
};
use blogsmith_shared::{
    AppConfig, RunConfig, StageName, StageOutput, env_secret, init_config, load_config,
};

use crate::brief::{BriefArgs, OutputArgs, demo_brief};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Blogsmith: research, outline, draft and polish blog posts with an LLM.
#[derive(Parser)]
#[command(
    name = "blogsmith",
    version,
    about = "Generate SEO-aware blog posts through a multi-stage LLM pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Write one blog post from flags and/or a brief file.
    Write {
        #[command(flatten)]
        brief: BriefArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the built-in remote-work demo post.
    Demo {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Report which credentials and providers are configured.
    Check,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "blogsmith=info",
        1 => "blogsmith=debug",
        _ => "blogsmith=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Log how `.env` loading went, once tracing is up.
pub(crate) fn report_dotenv(result: dotenvy::Result<std::path::PathBuf>) {
    match result {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => debug!("no .env file"),
        Err(e) => warn!(error = %e, "failed to load .env"),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Write { brief, output } => cmd_write(&brief, &output).await,
        Command::Demo { output } => cmd_demo(&output).await,
        Command::Check => cmd_check().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_write(brief: &BriefArgs, output: &OutputArgs) -> Result<()> {
    let config = load_config()?;
    let run = brief.resolve(&config.defaults)?;
    let options = output.resolve(&config.defaults);
    generate(&config, run, &options, output.offline).await
}

async fn cmd_demo(output: &OutputArgs) -> Result<()> {
    let config = load_config()?;
    let options = output.resolve(&config.defaults);
    generate(&config, demo_brief(), &options, output.offline).await
}

async fn generate(
    config: &AppConfig,
    run: RunConfig,
    options: &PipelineOptions,
    offline: bool,
) -> Result<()> {
    let agents = build_agents(config, offline)?;

    info!(
        topic = %run.topic,
        word_count = run.word_count,
        faq = run.faq,
        has_product = run.has_product,
        "writing blog post"
    );

    let topic = run.topic.clone();
    let reporter = CliProgress::new();
    let result = create_blog(run, &agents, options, &reporter).await?;

    print_summary(&topic, &result);
    Ok(())
}

/// Wire the stage agents to the completion backend and whichever providers
/// have credentials.
fn build_agents(config: &AppConfig, offline: bool) -> Result<Agents> {
    let backend = OpenAiBackend::from_config(&config.completion)?;
    if !backend.has_credential() {
        warn!(
            env = %config.completion.api_key_env,
            "no completion API key, every stage will degrade"
        );
    }
    debug!(model = backend.model(), "completion backend ready");
    let completer = Completer::from_backend(backend);

    if offline {
        info!("offline run, search and keyword ideas disabled");
        return Ok(Agents::new(completer));
    }

    let search: Option<Arc<dyn SearchProvider>> = match env_secret(&config.search.api_key_env) {
        Some(key) => Some(Arc::new(SerperSearch::new(&config.search, Some(key))?)),
        None => {
            info!(env = %config.search.api_key_env, "no search API key, research runs without web results");
            None
        }
    };

    let keyword_ideas = GoogleAdsKeywordIdeas::from_config(&config.keywords)?;
    let ideas: Option<Arc<dyn KeywordIdeasProvider>> = if keyword_ideas.credentials().is_complete() {
        Some(Arc::new(keyword_ideas))
    } else {
        info!("Google Ads credentials incomplete, keyword research runs without search volumes");
        None
    };

    Ok(Agents::with_providers(
        completer,
        search,
        ideas,
        &config.keywords.location,
    ))
}

fn print_summary(topic: &str, result: &BlogRun) {
    let degraded = result.degraded_stages();

    println!();
    if degraded.is_empty() {
        println!("  Blog post written!");
    } else {
        println!("  Blog post written with {} degraded stage(s).", degraded.len());
    }
    println!("  Run:     {}", result.run_id);
    println!("  Topic:   {topic}");
    if let Some(title) = &result.generated_title {
        println!("  Title:   {title}");
    }
    println!("  Path:    {}", result.output_path.display());
    println!("  SHA-256: {}", result.content_hash);
    println!("  Words:   {}", result.final_text.split_whitespace().count());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());

    for stage in degraded {
        if let Some(record) = result.stages.iter().find(|r| r.stage == stage) {
            println!("  ! {:<18} {}", stage.as_str(), record.output.text);
        }
    }
    println!();
}

async fn cmd_check() -> Result<()> {
    let config = load_config()?;

    println!();
    println!("  Completion");
    println!("    Endpoint: {}", config.completion.base_url);
    println!("    Model:    {}", config.completion.model);
    println!(
        "    API key:  {}",
        presence(&config.completion.api_key_env)
    );

    println!("  Search");
    let search = SerperSearch::from_config(&config.search)?;
    let stats = search.stats();
    println!("    API key:  {}", presence(&config.search.api_key_env));
    println!(
        "    Ready:    {}",
        if stats.api_key_configured { "yes" } else { "no" }
    );

    println!("  Keyword ideas");
    let credentials = GoogleAdsCredentials::from_env(&config.keywords);
    let auth = if credentials.access_token.is_some() {
        "access token"
    } else if credentials.refresh_token.is_some() {
        "refresh token"
    } else {
        "missing"
    };
    println!(
        "    Developer token: {}",
        presence(&config.keywords.developer_token_env)
    );
    println!(
        "    Customer ID:     {}",
        presence(&config.keywords.customer_id_env)
    );
    println!("    Auth:            {auth}");
    println!(
        "    Ready:           {}",
        if credentials.is_complete() { "yes" } else { "no" }
    );

    let location = SUPPORTED_LOCATIONS
        .iter()
        .find(|(id, _)| *id == config.keywords.location)
        .map(|(_, name)| *name);
    match location {
        Some(name) => println!("    Location:        {} ({name})", config.keywords.location),
        None => println!(
            "    Location:        {} (unsupported)",
            config.keywords.location
        ),
    }
    println!();

    if env_secret(&config.completion.api_key_env).is_none() {
        return Err(eyre!(
            "{} is not set; every stage would degrade",
            config.completion.api_key_env
        ));
    }
    Ok(())
}

fn presence(env_var: &str) -> String {
    match env_secret(env_var) {
        Some(_) => format!("set ({env_var})"),
        None => format!("missing ({env_var})"),
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config file created: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

fn stage_label(stage: StageName) -> &'static str {
    match stage {
        StageName::Researcher => "Researching topic",
        StageName::KeywordSeeds => "Generating seed keywords",
        StageName::KeywordResearcher => "Researching keywords",
        StageName::TrendResearcher => "Researching trends",
        StageName::OutlineCreator => "Creating outline",
        StageName::Writer => "Writing draft",
        StageName::SeoChecker => "Checking SEO",
        StageName::Proofreader => "Proofreading",
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, stage: StageName) {
        self.spinner.set_message(format!("{}...", stage_label(stage)));
    }

    fn stage_finished(&self, stage: StageName, output: &StageOutput) {
        if let Some(failure) = output.failure() {
            self.spinner
                .println(format!("  ! {} degraded: {}", stage_label(stage), failure.message));
        }
    }

    fn done(&self, _run: &BlogRun) {
        self.spinner.finish_and_clear();
    }
}
