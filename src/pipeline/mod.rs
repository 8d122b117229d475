//! Pipeline orchestration for video-to-summary runs.
//!
//! This module wires the caption → transcription → summarization flow and
//! exposes the run state machine the presentation layer observes.
//!
//! # Architecture
//!
//! ```text
//! RunRequest
//!     │
//!     ▼
//! PipelineOrchestrator::run()            ← one active run at a time
//!     │
//!     ├─ captions::fetch_best_caption_text   [FetchingCaptions]
//!     ├─ Transcriber::transcribe             [Transcribing]   (fallback)
//!     └─ Summarizer::summarize               [Summarizing]    (credential-gated)
//!     │
//!     ▼
//! RunReport { state, transcript, summary, used_captions, status }
//! ```
//!
//! Status narration flows through a [`StatusSink`]; the sink is invoked
//! synchronously and must not block.

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineBusy, PipelineOrchestrator};
pub use state::{RunReport, RunRequest, RunState, StatusSink, NO_API_KEY_SUMMARY};
