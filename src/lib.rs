//! video-summary — video-to-transcript-to-summary pipeline.
//!
//! Given a local media file (and optionally the identifier of the source
//! video), the pipeline produces a text transcript and an AI-generated
//! summary. Pre-existing caption tracks are preferred over local speech
//! recognition, and the remote summarization call only happens when an API
//! key is configured.
//!
//! # Modules
//!
//! - [`captions`]   — caption manifest lookup and best-track selection.
//! - [`model`]      — speech model variants and the on-disk model cache.
//! - [`transcribe`] — Whisper transcription of local media files.
//! - [`summarize`]  — chat-completion summarization client.
//! - [`pipeline`]   — the orchestrator and run state machine.
//! - [`config`]     — settings and platform paths.
//! - [`cancel`]     — the shared per-run cancellation token.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use video_summary::cancel::CancelToken;
//! use video_summary::captions::NoCaptionSource;
//! use video_summary::config::AppConfig;
//! use video_summary::model::{HttpModelSource, ModelCache, ModelVariant};
//! use video_summary::pipeline::{PipelineOrchestrator, RunRequest, StatusSink};
//! use video_summary::summarize::OpenAiSummarizer;
//! use video_summary::transcribe::WhisperTranscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let client = reqwest::Client::new();
//!
//!     let cache = ModelCache::new(
//!         video_summary::config::AppPaths::new().models_dir,
//!         Arc::new(HttpModelSource::new(client.clone())),
//!     );
//!
//!     let status: StatusSink = Arc::new(|msg: &str| println!("{msg}"));
//!     let orchestrator = PipelineOrchestrator::new(
//!         Arc::new(NoCaptionSource),
//!         Arc::new(WhisperTranscriber::new(cache.clone())),
//!         Arc::new(OpenAiSummarizer::new(client, config.summary.clone())),
//!         cache,
//!         config.has_api_key(),
//!         status,
//!     );
//!
//!     let cancel = CancelToken::new();
//!     orchestrator
//!         .download_model(ModelVariant::Base, |_| {}, &cancel)
//!         .await?;
//!
//!     let report = orchestrator
//!         .run(RunRequest {
//!             file_path: "talk.mp4".into(),
//!             video_id: None,
//!             variant: ModelVariant::Base,
//!             language: config.summary.language.clone(),
//!         })
//!         .await?;
//!
//!     println!("{}", report.transcript);
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod captions;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod summarize;
pub mod transcribe;
