//! CLI entry point — video-summary.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the shared `reqwest::Client` and the model cache.
//! 4. Compose the pipeline orchestrator from its seams.
//! 5. `--download`: fetch the model with a progress bar and exit.
//! 6. Otherwise run the pipeline; Ctrl-C cancels the active run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use video_summary::{
    cancel::CancelToken,
    captions::NoCaptionSource,
    config::{AppConfig, AppPaths},
    model::{HttpModelSource, ModelCache, ModelVariant},
    pipeline::{PipelineOrchestrator, RunRequest, RunState, StatusSink},
    summarize::OpenAiSummarizer,
    transcribe::WhisperTranscriber,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Transcribe a local video/audio file and generate an AI summary.
///
/// Prefers the source video's caption track when a video id is given; falls
/// back to local Whisper speech recognition otherwise.
#[derive(Debug, Parser)]
#[command(name = "video-summary", version)]
struct Cli {
    /// Local media file to transcribe and summarize.
    file: PathBuf,

    /// Source-video identifier for caption lookup (skipped when omitted).
    #[arg(long)]
    video_id: Option<String>,

    /// Speech model variant: tiny, base, small or medium.
    /// Defaults to the configured model.
    #[arg(long)]
    model: Option<ModelVariant>,

    /// Summary language code ("ko", "en", others get a neutral prompt).
    /// Defaults to the configured language.
    #[arg(long)]
    language: Option<String>,

    /// Download the selected speech model if missing, then exit.
    #[arg(long)]
    download: bool,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let variant = match cli.model {
        Some(variant) => variant,
        None => config
            .transcribe
            .model
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid model variant in settings.toml")?,
    };
    let language = cli
        .language
        .unwrap_or_else(|| config.summary.language.clone());

    // One HTTP client for the whole process: model downloads and
    // summarization share its connection pool.
    let client = reqwest::Client::new();

    let models_dir = config
        .transcribe
        .models_dir
        .clone()
        .unwrap_or_else(|| AppPaths::new().models_dir);
    let cache = ModelCache::new(models_dir, Arc::new(HttpModelSource::new(client.clone())));

    let status: StatusSink = Arc::new(|msg: &str| println!("{msg}"));

    let orchestrator = Arc::new(
        PipelineOrchestrator::new(
            Arc::new(NoCaptionSource),
            Arc::new(WhisperTranscriber::new(cache.clone())),
            Arc::new(OpenAiSummarizer::new(client, config.summary.clone())),
            cache,
            config.has_api_key(),
            status,
        )
        .with_transcribe_language(config.transcribe.language.clone()),
    );

    // Ctrl-C cancels whatever is in flight (download or run).
    let interrupt = CancelToken::new();
    {
        let interrupt = interrupt.clone();
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, cancelling");
                interrupt.cancel();
                orchestrator.cancel();
            }
        });
    }

    // ── Download-only mode ───────────────────────────────────────────────
    if cli.download {
        download_with_progress(&orchestrator, variant, &interrupt).await?;
        return Ok(());
    }

    if !orchestrator.is_model_ready(variant) && cli.video_id.is_none() {
        println!(
            "Note: model '{variant}' (~{} MB) is not downloaded; run with --download first \
             unless captions are available.",
            variant.approx_size_mb()
        );
    }

    // ── Pipeline run ─────────────────────────────────────────────────────
    let report = orchestrator
        .run(RunRequest {
            file_path: cli.file,
            video_id: cli.video_id,
            variant,
            language,
        })
        .await?;

    match report.state {
        RunState::Completed => {
            println!("\n--- Transcript ---\n{}", report.transcript);
            println!("\n--- Summary ---\n{}", report.summary);
            Ok(())
        }
        RunState::ModelNotReady => {
            println!("Run `video-summary --download --model {variant} <file>` to fetch the model.");
            Ok(())
        }
        RunState::Cancelled => Ok(()),
        _ => anyhow::bail!("{}", report.status),
    }
}

/// Download a model variant with an indicatif progress bar.
async fn download_with_progress(
    orchestrator: &PipelineOrchestrator,
    variant: ModelVariant,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(
        "{spinner} {bytes} / {total_bytes} ({bytes_per_sec})",
    )?);

    orchestrator
        .download_model(
            variant,
            |progress| {
                if let Some(total) = progress.total {
                    bar.set_length(total);
                }
                bar.set_position(progress.bytes);
            },
            cancel,
        )
        .await?;

    bar.finish_and_clear();
    Ok(())
}
