//! Pipeline orchestrator — drives captions → transcription → summarization.
//!
//! [`PipelineOrchestrator`] owns the staged-fallback control flow for one
//! run at a time:
//!
//! ```text
//! run(request)
//!   ├─ video id?      → fetch_best_caption_text     [FetchingCaptions]
//!   │     ├─ Ok       → transcript from captions (speech engine skipped)
//!   │     └─ NotFound / Transient → fall through (status note only)
//!   ├─ no transcript? → Transcriber::transcribe      [Transcribing]
//!   │     └─ model absent → ModelNotReady (early stop, not a failure)
//!   ├─ credentials?   → Summarizer::summarize        [Summarizing]
//!   │     └─ absent   → fixed placeholder summary
//!   └─ Completed
//! ```
//!
//! Cancellation from any stage short-circuits to `Cancelled`; unexpected
//! stage errors map to `Failed` with the error text as the final status.
//! Only one run may be active per orchestrator; a second `run` call is
//! rejected with [`PipelineBusy`] while the first is in flight.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::cancel::CancelToken;
use crate::captions::{fetch_best_caption_text, CaptionError, CaptionSource};
use crate::model::{DownloadError, DownloadProgress, ModelCache, ModelVariant};
use crate::pipeline::state::{RunReport, RunRequest, RunState, StatusSink, NO_API_KEY_SUMMARY};
use crate::summarize::{SummarizeError, Summarizer};
use crate::transcribe::{SegmentSink, TranscribeError, Transcriber};

// ---------------------------------------------------------------------------
// PipelineBusy
// ---------------------------------------------------------------------------

/// A run was requested while another is still in flight.
///
/// The in-flight run is untouched; callers may [`cancel`] and retry.
///
/// [`cancel`]: PipelineOrchestrator::cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a pipeline run is already in progress")]
pub struct PipelineBusy;

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Sequences the caption, transcription and summarization stages for one
/// run at a time.
///
/// All collaborators are injected as trait objects so the orchestrator can
/// be driven entirely by test doubles.
pub struct PipelineOrchestrator {
    captions: Arc<dyn CaptionSource>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    cache: ModelCache,
    has_credentials: bool,
    transcribe_language: String,
    status: StatusSink,
    active: Mutex<Option<CancelToken>>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `captions`        — caption capability for the source platform.
    /// * `transcriber`     — speech engine (e.g. `WhisperTranscriber`).
    /// * `summarizer`      — summarization client (e.g. `OpenAiSummarizer`).
    /// * `cache`           — model cache backing readiness checks/downloads.
    /// * `has_credentials` — whether a usable summarization API key exists;
    ///   decides at run time if the summarization stage executes at all.
    /// * `status`          — narration callback (non-blocking contract).
    pub fn new(
        captions: Arc<dyn CaptionSource>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        cache: ModelCache,
        has_credentials: bool,
        status: StatusSink,
    ) -> Self {
        Self {
            captions,
            transcriber,
            summarizer,
            cache,
            has_credentials,
            transcribe_language: "auto".into(),
            status,
            active: Mutex::new(None),
        }
    }

    /// Override the speech-recognition language hint (default `"auto"`).
    pub fn with_transcribe_language(mut self, language: impl Into<String>) -> Self {
        self.transcribe_language = language.into();
        self
    }

    /// Returns `true` while a run is in flight.
    pub fn is_running(&self) -> bool {
        self.active.lock().is_ok_and(|a| a.is_some())
    }

    /// Cancel the active run, if any. Safe to call at any time.
    pub fn cancel(&self) {
        if let Ok(active) = self.active.lock() {
            if let Some(token) = active.as_ref() {
                token.cancel();
            }
        }
    }

    /// Returns `true` if the variant's model file is already downloaded.
    pub fn is_model_ready(&self, variant: ModelVariant) -> bool {
        self.cache.is_present(variant)
    }

    /// Download the variant's model file unless already present.
    ///
    /// Independent of any pipeline run — it takes its own cancellation
    /// token and may execute while no run is active.
    pub async fn download_model<F>(
        &self,
        variant: ModelVariant,
        progress: F,
        cancel: &CancelToken,
    ) -> Result<(), DownloadError>
    where
        F: Fn(DownloadProgress),
    {
        self.narrate(&format!("Downloading speech model '{variant}'..."));
        let result = self.cache.ensure_downloaded(variant, progress, cancel).await;
        match &result {
            Ok(()) => self.narrate(&format!("Speech model '{variant}' is ready.")),
            Err(DownloadError::Cancelled) => self.narrate("Model download cancelled."),
            Err(e) => self.narrate(&format!("Model download failed: {e}")),
        }
        result
    }

    // -----------------------------------------------------------------------
    // run
    // -----------------------------------------------------------------------

    /// Execute one full pipeline run.
    ///
    /// Rejects with [`PipelineBusy`] if another run is active. The returned
    /// [`RunReport`] always carries a terminal [`RunState`]; stage errors
    /// are mapped into it rather than propagated.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport, PipelineBusy> {
        let cancel = {
            let mut active = self.active.lock().map_err(|_| PipelineBusy)?;
            if active.is_some() {
                return Err(PipelineBusy);
            }
            let token = CancelToken::new();
            *active = Some(token.clone());
            token
        };

        log::info!(
            "pipeline: run starting for {} (video id: {:?}, model: {})",
            request.file_path.display(),
            request.video_id,
            request.variant
        );

        let report = self.run_stages(&request, &cancel).await;

        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }

        log::info!(
            "pipeline: run finished in state {} ({})",
            report.state.label(),
            report.status
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Stage sequencing
    // -----------------------------------------------------------------------

    async fn run_stages(&self, request: &RunRequest, cancel: &CancelToken) -> RunReport {
        let mut report = RunReport::default();
        let mut transcript = String::new();

        // ── Stage 1: captions (optional, best-effort) ────────────────────
        if let Some(video_id) = request.video_id.as_deref() {
            report.state = RunState::FetchingCaptions;
            self.update(&mut report, "Checking for source captions...");

            match fetch_best_caption_text(self.captions.as_ref(), video_id, cancel).await {
                Ok((text, track)) => {
                    transcript = text;
                    report.used_captions = true;
                    self.update(
                        &mut report,
                        &format!("Caption text extracted ({}).", track.display_name),
                    );
                }
                Err(CaptionError::Cancelled) => return self.cancelled(report),
                Err(CaptionError::NotFound) => {
                    self.update(
                        &mut report,
                        "No captions available - falling back to speech recognition.",
                    );
                }
                Err(CaptionError::Transient(reason)) => {
                    // Best-effort stage: a network hiccup is handled exactly
                    // like absence.
                    log::warn!("pipeline: caption fetch failed ({reason})");
                    self.update(
                        &mut report,
                        "Caption lookup failed - falling back to speech recognition.",
                    );
                }
            }
        }

        // ── Stage 2: speech recognition (when captions produced nothing) ─
        if transcript.is_empty() {
            if !self.cache.is_present(request.variant) {
                self.update(
                    &mut report,
                    &format!(
                        "Speech model '{}' is not downloaded - download it before transcribing.",
                        request.variant
                    ),
                );
                report.state = RunState::ModelNotReady;
                return report;
            }

            report.state = RunState::Transcribing;
            self.update(&mut report, "Transcribing speech...");

            let segment_sink: SegmentSink = {
                let status = Arc::clone(&self.status);
                Arc::new(move |count| {
                    status(&format!("Transcribing speech... ({count} segments processed)"));
                })
            };

            match self
                .transcriber
                .transcribe(
                    &request.file_path,
                    request.variant,
                    &self.transcribe_language,
                    segment_sink,
                    cancel,
                )
                .await
            {
                Ok(text) => {
                    transcript = text;
                    self.update(&mut report, "Speech recognition complete.");
                }
                Err(TranscribeError::Cancelled) => return self.cancelled(report),
                Err(TranscribeError::ModelMissing(path)) => {
                    // Model vanished between the readiness check and the
                    // engine opening it.
                    self.update(
                        &mut report,
                        &format!("Speech model is no longer available ({path})."),
                    );
                    report.state = RunState::ModelNotReady;
                    return report;
                }
                Err(e) => return self.failed(report, &e.to_string()),
            }
        }

        report.transcript = transcript.clone();
        let via = if report.used_captions {
            "source captions"
        } else {
            "speech recognition"
        };

        // ── Stage 3: summarization (credential-gated) ────────────────────
        if self.has_credentials {
            report.state = RunState::Summarizing;
            self.update(&mut report, "Generating AI summary...");

            match self
                .summarizer
                .summarize(&transcript, &request.language, cancel)
                .await
            {
                Ok(summary) => {
                    report.summary = summary;
                    self.update(&mut report, &format!("Summary complete (used {via})."));
                }
                Err(SummarizeError::Cancelled) => return self.cancelled(report),
                Err(SummarizeError::MissingCredential) => {
                    // The client's defensive check disagreed with ours; fall
                    // back to the credential-absent outcome.
                    report.summary = NO_API_KEY_SUMMARY.to_string();
                    self.update(
                        &mut report,
                        &format!("Transcript ready (used {via}); no API key, summary skipped."),
                    );
                }
                Err(e) => return self.failed(report, &e.to_string()),
            }
        } else {
            report.summary = NO_API_KEY_SUMMARY.to_string();
            self.update(
                &mut report,
                &format!("Transcript ready (used {via}); no API key, summary skipped."),
            );
        }

        report.state = RunState::Completed;
        report
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Update the report's status and narrate it.
    fn update(&self, report: &mut RunReport, message: &str) {
        report.status = message.to_string();
        self.narrate(message);
    }

    fn narrate(&self, message: &str) {
        log::info!("pipeline: {message}");
        (self.status)(message);
    }

    fn cancelled(&self, mut report: RunReport) -> RunReport {
        report.state = RunState::Cancelled;
        report.summary.clear();
        self.update(&mut report, "Operation cancelled.");
        report
    }

    fn failed(&self, mut report: RunReport, message: &str) -> RunReport {
        report.state = RunState::Failed;
        self.update(&mut report, &format!("Error: {message}"));
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
