//! Speech model variants and the on-disk model cache.
//!
//! This module provides:
//! * [`ModelVariant`] — enumerated size tier of the offline speech model.
//! * [`ModelCache`] — presence checks and idempotent, cancellable downloads
//!   into the models directory, with cumulative byte progress.
//! * [`ModelSource`] / [`ModelStream`] — capability traits for the remote
//!   distribution source, with [`HttpModelSource`] as the shipped
//!   implementation (whisper.cpp GGML files).
//! * [`DownloadError`] / [`DownloadProgress`] — download outcomes and
//!   progress reports.
//!
//! A failed or cancelled download never leaves a partial file at the
//! canonical path: bytes stream into a unique temp file that is atomically
//! persisted only on success.

pub mod cache;
pub mod variant;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cache::{
    DownloadError, DownloadProgress, HttpModelSource, ModelCache, ModelSource, ModelStream,
};
pub use variant::{ModelVariant, ALL_VARIANTS};
