//! Caption lookup for source videos.
//!
//! This module provides:
//! * [`CaptionSource`] — async capability trait for the external video
//!   platform (caption manifest + track line fetch).
//! * [`CaptionTrack`] — one language-tagged track from a manifest.
//! * [`fetch_best_caption_text`] — selection + fetch adapter used by the
//!   pipeline; prefers Korean, then English, then manifest order.
//! * [`CaptionError`] — classified outcomes (`NotFound` / `Transient` /
//!   `Cancelled`) so the caller's fallback logic is driven by error kind,
//!   not blanket suppression.
//!
//! Captions are a best-effort optimization: callers treat `Transient`
//! exactly like `NotFound` and fall back to local speech recognition.

pub mod adapter;
pub mod source;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use adapter::{fetch_best_caption_text, CaptionError};
pub use source::{CaptionSource, CaptionSourceError, CaptionTrack, NoCaptionSource};

#[cfg(test)]
pub use source::MockCaptionSource;
