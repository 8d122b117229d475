//! Run state machine and the request/report types for one pipeline run.
//!
//! [`RunState`] drives the orchestrator's state machine. [`RunReport`] is
//! the terminal snapshot handed back to the caller; while a run is in
//! flight, progress is narrated through the [`StatusSink`] only.

use std::path::PathBuf;
use std::sync::Arc;

use crate::model::ModelVariant;

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// States of the video-to-summary pipeline.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──video id present──▶ FetchingCaptions
///      ──no video id───────▶ Transcribing
///
/// FetchingCaptions ──captions found──▶ Summarizing / Completed
///                  ──none / hiccup──▶ Transcribing
///
/// Transcribing ──model absent──▶ ModelNotReady   (deliberate early stop)
///              ──transcript────▶ Summarizing     (credentials present)
///              ──transcript────▶ Completed       (credentials absent)
///
/// Summarizing ──summary──▶ Completed
///
/// any state ──cancel──▶ Cancelled
/// any state ──error───▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress yet.
    Idle,

    /// Looking up the source video's caption manifest.
    FetchingCaptions,

    /// Running local speech recognition on the input file.
    Transcribing,

    /// Waiting on the remote summarization service.
    Summarizing,

    /// Terminal: transcript (and summary or placeholder) are ready.
    Completed,

    /// Terminal: the run was cancelled by the caller.
    Cancelled,

    /// Terminal: a mandatory stage failed; the status message carries the
    /// underlying error.
    Failed,

    /// Terminal: speech recognition was needed but the selected model is not
    /// downloaded. Deliberate early stop — neither `Completed` nor `Failed`.
    ModelNotReady,
}

impl RunState {
    /// Returns `true` for states no run ever leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed | RunState::ModelNotReady
        )
    }

    /// A short human-readable label for logs and UIs.
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::FetchingCaptions => "Fetching captions",
            RunState::Transcribing => "Transcribing",
            RunState::Summarizing => "Summarizing",
            RunState::Completed => "Completed",
            RunState::Cancelled => "Cancelled",
            RunState::Failed => "Failed",
            RunState::ModelNotReady => "Model not ready",
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Idle
    }
}

// ---------------------------------------------------------------------------
// RunRequest
// ---------------------------------------------------------------------------

/// Input for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Local media file to transcribe when captions are unavailable.
    pub file_path: PathBuf,
    /// Source-video identifier for caption lookup. `None` skips the caption
    /// stage entirely.
    pub video_id: Option<String>,
    /// Speech model tier to transcribe with.
    pub variant: ModelVariant,
    /// ISO-639-1 code selecting the summarization prompt.
    pub language: String,
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Placeholder set as the summary when no API key is configured. Mutually
/// exclusive with real summary text.
pub const NO_API_KEY_SUMMARY: &str =
    "(No API key is configured, so no summary was generated. \
     Add a key in settings to enable AI summaries.)";

/// Terminal snapshot of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Terminal state the run ended in.
    pub state: RunState,
    /// Full transcript text; empty when no stage produced one.
    pub transcript: String,
    /// Summary text, [`NO_API_KEY_SUMMARY`] when credentials were absent, or
    /// empty when the run ended before the summarization decision.
    pub summary: String,
    /// `true` when the transcript came from source captions — speech
    /// recognition was never invoked for this run.
    pub used_captions: bool,
    /// Last status message; for terminal states this describes the outcome.
    pub status: String,
}

// ---------------------------------------------------------------------------
// StatusSink
// ---------------------------------------------------------------------------

/// Status narration callback.
///
/// Receives every human-readable status update exactly once, in order.
/// Invoked synchronously from the orchestrator; it must not block — forward
/// to a channel if the consumer is slow.
pub type StatusSink = Arc<dyn Fn(&str) + Send + Sync>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
