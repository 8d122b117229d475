//! Speech-to-text transcription of local media files.
//!
//! This module provides:
//! * [`Transcriber`] — async seam the pipeline drives; object-safe and
//!   mockable.
//! * [`WhisperTranscriber`] — production implementation: ffmpeg normalises
//!   the input to 16 kHz mono WAV, `hound` decodes it, and `whisper_rs`
//!   runs inference on the blocking thread pool with incremental segment
//!   reporting and a cancellation abort callback.
//! * [`TranscribeError`] — subsystem error variants.
//! * [`SegmentSink`] — per-segment progress callback (1-based running
//!   count), invoked synchronously in production order.
//!
//! The engine's contract is all-or-nothing: a cancelled run returns
//! [`TranscribeError::Cancelled`] and never a partial transcript.

pub mod audio;
pub mod engine;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{SegmentSink, TranscribeError, Transcriber, WhisperTranscriber};

#[cfg(test)]
pub use engine::MockTranscriber;
