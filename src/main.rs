use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use podcast_studio::domain::assembly::AudioAssembler;
use podcast_studio::domain::pipeline::{PipelineDriver, PipelineMode, PipelineOptions, PipelineRequest};
use podcast_studio::domain::synthesis::{JobOrchestrator, OrchestratorSettings};
use podcast_studio::infrastructure::config::{Config, LogFormat, TtsProvider};
use podcast_studio::infrastructure::http::start_http_server;
use podcast_studio::infrastructure::media::FfmpegConcatenator;
use podcast_studio::infrastructure::repositories::{
    build_http_client, build_synthesis_client, OpenAiScriptRepository, RssNewsRepository,
};

#[derive(Parser, Debug)]
#[command(name = "podcast-studio", about = "Two-host tech news podcast pipeline")]
struct Cli {
    /// Episode date (YYYY-MM-DD), defaults to today
    date: Option<String>,

    /// Synthesize and merge from the existing talks.txt
    #[arg(long, group = "mode")]
    audio_only: bool,

    /// Merge the existing segments only
    #[arg(long, group = "mode")]
    merge_only: bool,

    /// Stop after the script is written
    #[arg(long, group = "mode")]
    no_tts: bool,

    /// Regenerate talks.txt from the existing news.txt
    #[arg(long, group = "mode")]
    script: bool,

    /// Synthesize segments from the existing talks.txt without merging
    #[arg(long, group = "mode")]
    audio: bool,

    /// Regenerate show_notes.md from the existing news.txt
    #[arg(long, group = "mode")]
    shownotes: bool,

    /// Serve the HTTP API instead of running once
    #[arg(long, group = "mode")]
    serve: bool,

    /// Reuse news.txt instead of fetching the feed
    #[arg(long)]
    skip_fetch: bool,

    /// Feed URL, overrides RSS_URL
    #[arg(long)]
    rss: Option<String>,

    /// Dialogue indices (0-based) to synthesize again, e.g. 55,62
    #[arg(long, value_delimiter = ',')]
    indices: Vec<usize>,

    /// TTS provider, overrides TTS_PROVIDER
    #[arg(long)]
    provider: Option<TtsProvider>,

    /// Merge even when segments are missing
    #[arg(long)]
    allow_gaps: bool,

    /// Rebuild merged audio and the script even when they exist
    #[arg(long)]
    overwrite: bool,

    /// Do not prepend the intro clip
    #[arg(long)]
    no_intro: bool,
}

impl Cli {
    fn mode(&self) -> PipelineMode {
        if self.merge_only {
            PipelineMode::MergeOnly
        } else if self.audio_only {
            PipelineMode::AudioOnly
        } else if self.audio {
            PipelineMode::SynthesisOnly
        } else if self.script {
            PipelineMode::ScriptFromNews
        } else if self.shownotes {
            PipelineMode::ShowNotes
        } else if self.no_tts {
            PipelineMode::ScriptOnly
        } else {
            PipelineMode::Full
        }
    }

    fn request(&self) -> Result<PipelineRequest, String> {
        let date = match &self.date {
            Some(date) => {
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", date))?;
                date.clone()
            }
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };

        let mut request = PipelineRequest::new(date, self.mode());
        request.rss_url = self.rss.clone();
        request.skip_fetch = self.skip_fetch;
        request.indices = self.indices.clone();
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(provider) = cli.provider {
        config.tts.provider = provider;
    }

    // Initialize logging
    init_logging(&config);

    let http = build_http_client(&config)?;

    // === DEPENDENCY INJECTION SETUP ===
    let concatenator = Arc::new(FfmpegConcatenator::new(config.assembly.ffmpeg_path.clone()));
    let options = PipelineOptions {
        intro_path: (!cli.no_intro).then(|| config.assembly.intro_path.clone()),
        allow_gaps: cli.allow_gaps,
        overwrite: cli.overwrite,
        news_limit: config.news.limit,
        default_rss_url: config.news.rss_url.clone(),
    };

    let mut driver = PipelineDriver::new(
        config.output_root.clone(),
        AudioAssembler::new(concatenator),
        options,
    )
    .with_news_source(Arc::new(RssNewsRepository::new(http.clone())));

    match build_synthesis_client(&config, http.clone()) {
        Ok((client, voices)) => {
            tracing::info!(provider = %config.tts.provider, voices = voices.len(), "TTS provider ready");
            let settings = OrchestratorSettings {
                concurrency_limit: config.tts.max_concurrent,
                poll_interval: config.tts.poll_interval,
                job_timeout: config.tts.job_timeout,
                max_poll_errors: config.tts.max_poll_errors,
            };
            driver = driver.with_orchestrator(JobOrchestrator::new(client, voices, settings));
        }
        Err(e) => {
            tracing::warn!(provider = %config.tts.provider, error = %e, "TTS provider unavailable, synthesis disabled");
        }
    }

    match &config.llm.api_key {
        Some(api_key) => {
            let client = OpenAiScriptRepository::client_for(api_key, &config.llm.base_url);
            driver = driver.with_script_writer(Arc::new(OpenAiScriptRepository::new(
                client,
                config.llm.model.clone(),
            )));
        }
        None => tracing::warn!("DEEPSEEK_API_KEY not set, script generation disabled"),
    }

    let driver = Arc::new(driver);

    if cli.serve {
        tracing::info!("Starting Podcast Studio on {}:{}", config.host, config.port);
        start_http_server(&config, driver).await?;
        return Ok(());
    }

    let request = cli.request()?;
    driver.run(&request).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "podcast_studio=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "podcast_studio=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
