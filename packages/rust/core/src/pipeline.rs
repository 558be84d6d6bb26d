//! End-to-end blog pipeline: research → keywords → trends → outline → draft →
//! SEO review → proofread → file.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use blogsmith_agents::{
    KeywordResearcher, OutlineCreator, OutlineRequest, ProductBrief, Proofreader, Researcher,
    SeoChecker, TrendResearcher, Writer, WriterRequest,
};
use blogsmith_completion::Completer;
use blogsmith_providers::{KeywordIdeasProvider, SearchProvider};
use blogsmith_shared::{
    BlogsmithError, DefaultsConfig, ProofreadSource, Result, RunConfig, RunId, StageName,
    StageOutput,
};

use crate::artifact::{self, ArtifactOptions};
use crate::outline::prepare_outline;
use crate::trends::TrendReport;

/// Knobs for one pipeline run that are not part of the brief.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub artifact: ArtifactOptions,
    pub proofread_source: ProofreadSource,
    /// Abort on the first degraded stage.
    pub strict: bool,
    /// Ask the researcher for news results as well as web results.
    pub include_news: bool,
}

impl PipelineOptions {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            artifact: ArtifactOptions::from_defaults(defaults),
            proofread_source: defaults.proofread_source,
            strict: defaults.strict,
            include_news: true,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_defaults(&DefaultsConfig::default())
    }
}

/// The seven stage agents, wired to one completer and optional providers.
pub struct Agents {
    pub researcher: Researcher,
    pub keyword_researcher: KeywordResearcher,
    pub trend_researcher: TrendResearcher,
    pub outline_creator: OutlineCreator,
    pub writer: Writer,
    pub seo_checker: SeoChecker,
    pub proofreader: Proofreader,
}

impl Agents {
    /// Agents with no external data providers.
    pub fn new(completer: Completer) -> Self {
        Self {
            researcher: Researcher::new(completer.clone()),
            keyword_researcher: KeywordResearcher::new(completer.clone()),
            trend_researcher: TrendResearcher::new(completer.clone()),
            outline_creator: OutlineCreator::new(completer.clone()),
            writer: Writer::new(completer.clone()),
            seo_checker: SeoChecker::new(completer.clone()),
            proofreader: Proofreader::new(completer),
        }
    }

    /// Agents with search and keyword-ideas providers injected where used.
    pub fn with_providers(
        completer: Completer,
        search: Option<Arc<dyn SearchProvider>>,
        ideas: Option<Arc<dyn KeywordIdeasProvider>>,
        location: &str,
    ) -> Self {
        let mut agents = Self::new(completer.clone());
        if let Some(search) = search {
            agents.researcher = Researcher::new(completer.clone()).with_search(search.clone());
            agents.trend_researcher = TrendResearcher::new(completer.clone()).with_search(search);
        }
        if let Some(ideas) = ideas {
            agents.keyword_researcher = KeywordResearcher::new(completer).with_ideas(ideas, location);
        }
        agents
    }
}

/// One stage's output, in run order.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub stage: StageName,
    pub output: StageOutput,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct BlogRun {
    pub run_id: RunId,
    /// Proofread text as written to disk (before tidying).
    pub final_text: String,
    /// SEO checker output, kept whichever text was proofread.
    pub seo_text: String,
    pub output_path: std::path::PathBuf,
    /// SHA-256 of the file content.
    pub content_hash: String,
    /// Title from the trend stage, when it produced any.
    pub generated_title: Option<String>,
    pub stages: Vec<StageRecord>,
    pub elapsed: Duration,
}

impl BlogRun {
    /// Stages whose output is a sentinel.
    pub fn degraded_stages(&self) -> Vec<StageName> {
        self.stages
            .iter()
            .filter(|r| r.output.is_degraded())
            .map(|r| r.stage)
            .collect()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, stage: StageName);
    fn stage_finished(&self, stage: StageName, output: &StageOutput);
    fn done(&self, run: &BlogRun);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _stage: StageName) {}
    fn stage_finished(&self, _stage: StageName, _output: &StageOutput) {}
    fn done(&self, _run: &BlogRun) {}
}

/// Collects stage outputs and applies strict mode.
struct StageLog<'a> {
    strict: bool,
    progress: &'a dyn ProgressReporter,
    records: Vec<StageRecord>,
}

impl StageLog<'_> {
    fn start(&self, stage: StageName) {
        self.progress.stage_started(stage);
    }

    fn finish(&mut self, stage: StageName, output: StageOutput) -> Result<String> {
        self.progress.stage_finished(stage, &output);

        if let Some(failure) = output.failure() {
            warn!(stage = %stage, kind = ?failure.kind, message = %failure.message, "stage degraded");
            if self.strict {
                return Err(BlogsmithError::Stage {
                    stage: stage.as_str().into(),
                    message: failure.message.clone(),
                });
            }
        }

        let text = output.text.clone();
        self.records.push(StageRecord { stage, output });
        Ok(text)
    }
}

/// Run the full pipeline for one brief.
///
/// In default mode a failing stage never aborts the run: its sentinel text
/// flows into later prompts like any other content. Only strict mode and
/// the final file write can return an error.
#[instrument(skip_all, fields(topic = %config.topic, strict = options.strict))]
pub async fn create_blog(
    config: RunConfig,
    agents: &Agents,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<BlogRun> {
    let start = Instant::now();
    let run_id = RunId::new();
    let config = config.normalized();
    let mut log = StageLog {
        strict: options.strict,
        progress,
        records: Vec::with_capacity(StageName::ALL.len()),
    };

    info!(%run_id, word_count = config.word_count, faq = config.faq, "starting blog pipeline");

    // --- Research ---
    log.start(StageName::Researcher);
    let output = agents
        .researcher
        .run(&config.topic, &config.keywords, options.include_news)
        .await;
    let research = log.finish(StageName::Researcher, output)?;

    // --- Keywords: seeds, then expansion ---
    log.start(StageName::KeywordSeeds);
    let output = agents
        .keyword_researcher
        .generate_seed_keywords(&config.topic, &config.tone, &config.language, &config.keywords)
        .await;
    let seed_keywords = log.finish(StageName::KeywordSeeds, output)?;

    log.start(StageName::KeywordResearcher);
    let output = agents
        .keyword_researcher
        .run(&config.topic, &seed_keywords, &config.tone, &config.language)
        .await;
    let keywords = log.finish(StageName::KeywordResearcher, output)?;

    // --- Trends ---
    log.start(StageName::TrendResearcher);
    let output = agents
        .trend_researcher
        .run(&config.topic, &keywords, &config.current_year, &config.language)
        .await;
    let trends = TrendReport::parse(&log.finish(StageName::TrendResearcher, output)?);
    let generated_title = trends
        .choose_title(&mut rand::thread_rng())
        .map(str::to_string);

    // --- Outline ---
    let product = ProductBrief::from_config(&config);

    log.start(StageName::OutlineCreator);
    let output = agents
        .outline_creator
        .run(OutlineRequest {
            topic: &config.topic,
            research: &research,
            keywords: &keywords,
            trend_summary: &trends.summary,
            faq: config.faq,
            product,
        })
        .await;
    let raw_outline = log.finish(StageName::OutlineCreator, output)?;
    let outline = prepare_outline(&raw_outline, config.faq, config.has_product);

    // --- Draft ---
    let title = config
        .explicit_title()
        .or(generated_title.as_deref())
        .unwrap_or_default();

    log.start(StageName::Writer);
    let output = agents
        .writer
        .run(WriterRequest {
            outline: &outline,
            research: &research,
            keywords: &keywords,
            trend_summary: &trends.summary,
            tone: &config.tone,
            language: &config.language,
            word_count: config.word_count,
            blog_length: config.blog_length,
            include_keywords: &config.include_keywords,
            avoid_keywords: &config.avoid_keywords,
            intent: &config.intent,
            title,
            product,
        })
        .await;
    let draft = log.finish(StageName::Writer, output)?;

    // --- SEO review ---
    log.start(StageName::SeoChecker);
    let output = agents.seo_checker.run(&draft, &keywords).await;
    let seo_text = log.finish(StageName::SeoChecker, output)?;

    // --- Proofread ---
    let to_proofread = match options.proofread_source {
        ProofreadSource::Draft => &draft,
        ProofreadSource::Seo => &seo_text,
    };

    log.start(StageName::Proofreader);
    let output = agents
        .proofreader
        .run(to_proofread, config.word_count, &config.audience, &config.url)
        .await;
    let final_text = log.finish(StageName::Proofreader, output)?;

    // --- Write ---
    let record = artifact::write_blog(&options.artifact, &config.topic, &final_text)?;

    let run = BlogRun {
        run_id,
        final_text,
        seo_text,
        output_path: record.path,
        content_hash: record.sha256,
        generated_title,
        stages: log.records,
        elapsed: start.elapsed(),
    };

    progress.done(&run);

    info!(
        run_id = %run.run_id,
        path = %run.output_path.display(),
        degraded = run.degraded_stages().len(),
        elapsed_ms = run.elapsed.as_millis(),
        "blog pipeline complete"
    );

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blogsmith_agents::{
        KEYWORD_RESEARCHER_ROLE, OUTLINE_CREATOR_ROLE, PROOFREADER_ROLE, RESEARCHER_ROLE,
        SEO_CHECKER_ROLE, TREND_RESEARCHER_ROLE, WRITER_ROLE,
    };
    use blogsmith_completion::CompletionBackend;
    use blogsmith_providers::{
        Competition, KeywordMetric, KeywordQuery, KeywordRecord, SearchRecord, SearchStats,
    };
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replies per role; unscripted roles get the prompt length as text.
    #[derive(Default)]
    struct Scripted {
        replies: Vec<(&'static str, String)>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn reply(mut self, role: &'static str, text: &str) -> Self {
            self.replies.push((role, text.into()));
            self
        }

        fn roles(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
        }

        fn prompts_for(&self, role: &str) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.0 == role)
                .map(|c| c.1.clone())
                .collect()
        }

        fn prompt_for(&self, role: &str) -> String {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.0 == role)
                .map(|c| c.1.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionBackend for Scripted {
        async fn complete(&self, instructions: &str, prompt: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((instructions.to_string(), prompt.to_string()));
            let reply = self
                .replies
                .iter()
                .find(|(role, _)| *role == instructions)
                .map(|(_, text)| text.clone())
                .unwrap_or_else(|| prompt.len().to_string());
            Ok(reply)
        }
    }

    /// Search provider that echoes each query back as a result title.
    #[derive(Default)]
    struct EchoSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for EchoSearch {
        async fn search(&self, query: &str, _count: usize) -> Vec<SearchRecord> {
            self.queries.lock().unwrap().push(query.to_string());
            vec![SearchRecord::Organic {
                title: format!("hit for {query}"),
                link: "https://example.com/hit".into(),
                snippet: "snippet".into(),
                date: None,
            }]
        }

        async fn search_news(&self, query: &str, _count: usize) -> Vec<SearchRecord> {
            vec![SearchRecord::News {
                title: format!("news for {query}"),
                link: "https://example.com/news".into(),
                snippet: "story".into(),
                date: None,
                source: None,
            }]
        }

        fn stats(&self) -> SearchStats {
            SearchStats::default()
        }
    }

    /// Keyword-ideas provider returning one fixed idea.
    #[derive(Default)]
    struct FixedIdeas {
        seeds: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KeywordIdeasProvider for FixedIdeas {
        async fn ideas(&self, query: &KeywordQuery) -> Vec<KeywordRecord> {
            self.seeds.lock().unwrap().extend(query.keywords().iter().cloned());
            vec![KeywordRecord::Idea(KeywordMetric {
                text: "async standup tools".into(),
                competition: Competition::Low,
                low_top_of_page_bid: 0.5,
                high_top_of_page_bid: 1.5,
                average_cpc: 1.0,
                avg_monthly_searches: 880,
            })]
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionBackend for Down {
        async fn complete(&self, _instructions: &str, _prompt: &str) -> Result<String> {
            Err(BlogsmithError::Network("service unavailable".into()))
        }
    }

    struct Recording(Mutex<Vec<String>>);

    impl ProgressReporter for Recording {
        fn stage_started(&self, stage: StageName) {
            self.0.lock().unwrap().push(format!("start:{stage}"));
        }
        fn stage_finished(&self, stage: StageName, _output: &StageOutput) {
            self.0.lock().unwrap().push(format!("finish:{stage}"));
        }
        fn done(&self, _run: &BlogRun) {
            self.0.lock().unwrap().push("done".into());
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("blogsmith-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    fn options(dir: &std::path::Path) -> PipelineOptions {
        let mut options = PipelineOptions::default();
        options.artifact.output_dir = dir.to_path_buf();
        options
    }

    fn brief() -> RunConfig {
        RunConfig {
            topic: "Remote Work".into(),
            word_count: 500,
            faq: false,
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn end_to_end_runs_each_stage_once_in_order() {
        let dir = temp_dir();
        let backend = Arc::new(Scripted::default());
        let agents = Agents::new(Completer::new(backend.clone()));

        let run = create_blog(brief(), &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(
            backend.roles(),
            [
                RESEARCHER_ROLE,
                KEYWORD_RESEARCHER_ROLE,
                KEYWORD_RESEARCHER_ROLE,
                TREND_RESEARCHER_ROLE,
                OUTLINE_CREATOR_ROLE,
                WRITER_ROLE,
                SEO_CHECKER_ROLE,
                PROOFREADER_ROLE,
            ]
        );
        let stages: Vec<StageName> = run.stages.iter().map(|r| r.stage).collect();
        assert_eq!(stages, StageName::ALL);

        let name = run.output_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.contains("Remote_Work"));
        let written = std::fs::read_to_string(&run.output_path).unwrap();
        assert!(!written.trim().is_empty());
        assert!(run.final_text.parse::<usize>().is_ok());
        assert_eq!(run.content_hash.len(), 64);
        assert!(run.degraded_stages().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn progress_sees_every_stage() {
        let dir = temp_dir();
        let agents = Agents::new(Completer::from_backend(Scripted::default()));
        let progress = Recording(Mutex::new(Vec::new()));

        create_blog(brief(), &agents, &options(&dir), &progress).await.unwrap();

        let events = progress.0.lock().unwrap();
        assert_eq!(events.len(), StageName::ALL.len() * 2 + 1);
        assert_eq!(events[0], "start:researcher");
        assert_eq!(events[1], "finish:researcher");
        assert_eq!(events.last().map(String::as_str), Some("done"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn outline_is_filtered_before_the_writer() {
        let dir = temp_dir();
        let backend = Arc::new(Scripted::default().reply(
            OUTLINE_CREATOR_ROLE,
            r#"Outline: [{"title":"Why remote","subtopics":["focus"]},{"faq":[{"question":"Q?","answer":"A"}]},{"product_title":"Desk"}]"#,
        ));
        let agents = Agents::new(Completer::new(backend.clone()));

        create_blog(brief(), &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();

        let writer_prompt = backend.prompt_for(WRITER_ROLE);
        assert!(writer_prompt.contains("Why remote"));
        assert!(!writer_prompt.contains("\"faq\""));
        assert!(!writer_prompt.contains("Desk"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn generated_title_reaches_writer_unless_explicit() {
        let dir = temp_dir();
        let trend_reply = r#"{"summary":"Async is trending","blog_titles":["The Async Office"]}"#;

        let backend = Arc::new(Scripted::default().reply(TREND_RESEARCHER_ROLE, trend_reply));
        let agents = Agents::new(Completer::new(backend.clone()));
        let run = create_blog(brief(), &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(run.generated_title.as_deref(), Some("The Async Office"));
        let prompt = backend.prompt_for(WRITER_ROLE);
        assert!(prompt.contains("use exactly \"The Async Office\""));
        assert!(prompt.contains("Async is trending"));

        let backend = Arc::new(Scripted::default().reply(TREND_RESEARCHER_ROLE, trend_reply));
        let agents = Agents::new(Completer::new(backend.clone()));
        let explicit = RunConfig {
            title: "My Own Title".into(),
            ..brief()
        };
        create_blog(explicit, &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();
        assert!(backend
            .prompt_for(WRITER_ROLE)
            .contains("use exactly \"My Own Title\""));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn proofread_source_selects_input() {
        let dir = temp_dir();
        let script = || {
            Scripted::default()
                .reply(WRITER_ROLE, "DRAFT TEXT")
                .reply(SEO_CHECKER_ROLE, "SEO TEXT")
        };

        let backend = Arc::new(script());
        let agents = Agents::new(Completer::new(backend.clone()));
        let run = create_blog(brief(), &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();
        assert!(backend.prompt_for(PROOFREADER_ROLE).contains("DRAFT TEXT"));
        assert_eq!(run.seo_text, "SEO TEXT");

        let backend = Arc::new(script());
        let agents = Agents::new(Completer::new(backend.clone()));
        let seo_options = PipelineOptions {
            proofread_source: ProofreadSource::Seo,
            ..options(&dir)
        };
        create_blog(brief(), &agents, &seo_options, &SilentProgress)
            .await
            .unwrap();
        let prompt = backend.prompt_for(PROOFREADER_ROLE);
        assert!(prompt.contains("SEO TEXT"));
        assert!(!prompt.contains("DRAFT TEXT"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failing_backend_still_writes_a_file() {
        let dir = temp_dir();
        let agents = Agents::new(Completer::from_backend(Down));

        let run = create_blog(brief(), &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(run.degraded_stages().len(), StageName::ALL.len());
        assert!(run.final_text.starts_with("[Error in Proofreader agent:"));
        assert!(run.output_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn strict_mode_stops_at_first_degraded_stage() {
        let dir = temp_dir();
        let agents = Agents::new(Completer::from_backend(Down));
        let strict = PipelineOptions {
            strict: true,
            ..options(&dir)
        };

        let err = create_blog(brief(), &agents, &strict, &SilentProgress)
            .await
            .unwrap_err();

        match err {
            BlogsmithError::Stage { stage, message } => {
                assert_eq!(stage, "researcher");
                assert!(message.contains("service unavailable"));
            }
            other => panic!("expected stage error, got {other:?}"),
        }
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn injected_providers_reach_their_agents() {
        let dir = temp_dir();
        let backend = Arc::new(Scripted::default().reply(KEYWORD_RESEARCHER_ROLE, "- hybrid work"));
        let search = Arc::new(EchoSearch::default());
        let ideas = Arc::new(FixedIdeas::default());
        let agents = Agents::with_providers(
            Completer::new(backend.clone()),
            Some(search.clone() as Arc<dyn SearchProvider>),
            Some(ideas.clone() as Arc<dyn KeywordIdeasProvider>),
            "2840",
        );

        let config = brief();
        let year = config.current_year.clone();
        create_blog(config, &agents, &options(&dir), &SilentProgress)
            .await
            .unwrap();

        let research = backend.prompt_for(RESEARCHER_ROLE);
        assert!(research.contains("hit for Remote Work"));
        assert!(research.contains("news for Remote Work"));

        let trend_query = format!("Current trending blog topics about Remote Work in {year}");
        assert!(backend.prompt_for(TREND_RESEARCHER_ROLE).contains(&format!("hit for {trend_query}")));
        assert_eq!(*search.queries.lock().unwrap(), ["Remote Work".to_string(), trend_query]);

        let keyword_prompts = backend.prompts_for(KEYWORD_RESEARCHER_ROLE);
        assert_eq!(keyword_prompts.len(), 2);
        assert!(!keyword_prompts[0].contains("async standup tools"));
        assert!(keyword_prompts[1].contains("async standup tools"));
        let seeds = ideas.seeds.lock().unwrap();
        assert!(seeds.iter().any(|s| s == "hybrid work"), "seeds: {seeds:?}");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
