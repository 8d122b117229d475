//! Caption source capability trait and track types.
//!
//! The actual video-platform client (manifest lookup, track download) lives
//! outside this crate; [`CaptionSource`] is the seam it plugs into. The
//! pipeline only ever talks to the trait object.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptionTrack
// ---------------------------------------------------------------------------

/// One caption track from a video's caption manifest.
///
/// Read-only snapshot fetched per run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    /// BCP-47-ish language code as reported by the platform (e.g. `"ko"`,
    /// `"en-US"`).
    pub language_code: String,
    /// Human-readable language name for status messages (e.g. `"Korean"`).
    pub display_name: String,
    /// Platform-provided priority data: `true` when the track was machine
    /// generated rather than author supplied.
    pub auto_generated: bool,
}

impl CaptionTrack {
    /// Convenience constructor used heavily in tests.
    pub fn new(
        language_code: impl Into<String>,
        display_name: impl Into<String>,
        auto_generated: bool,
    ) -> Self {
        Self {
            language_code: language_code.into(),
            display_name: display_name.into(),
            auto_generated,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptionSourceError
// ---------------------------------------------------------------------------

/// Transport-level failure from a [`CaptionSource`] implementation.
///
/// The adapter downgrades this to [`CaptionError::Transient`]; it never
/// reaches the pipeline directly.
///
/// [`CaptionError::Transient`]: crate::captions::CaptionError::Transient
#[derive(Debug, Clone, Error)]
#[error("caption source error: {0}")]
pub struct CaptionSourceError(pub String);

// ---------------------------------------------------------------------------
// CaptionSource trait
// ---------------------------------------------------------------------------

/// Async capability for querying a video platform's captions.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn CaptionSource>`.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// List the caption tracks available for `video_id`.
    ///
    /// An empty vector means the video has no captions — that is a normal
    /// outcome, not an error.
    async fn manifest(&self, video_id: &str) -> Result<Vec<CaptionTrack>, CaptionSourceError>;

    /// Fetch the text lines of one track, in display order.
    async fn lines(&self, track: &CaptionTrack) -> Result<Vec<String>, CaptionSourceError>;
}

// ---------------------------------------------------------------------------
// NoCaptionSource
// ---------------------------------------------------------------------------

/// A [`CaptionSource`] for callers without a platform client: every manifest
/// is empty, so the pipeline always falls through to speech recognition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaptionSource;

#[async_trait]
impl CaptionSource for NoCaptionSource {
    async fn manifest(&self, _video_id: &str) -> Result<Vec<CaptionTrack>, CaptionSourceError> {
        Ok(Vec::new())
    }

    async fn lines(&self, track: &CaptionTrack) -> Result<Vec<String>, CaptionSourceError> {
        Err(CaptionSourceError(format!(
            "no caption source configured (requested track {})",
            track.language_code
        )))
    }
}

// ---------------------------------------------------------------------------
// MockCaptionSource  (test-only)
// ---------------------------------------------------------------------------

/// Test double with a fixed manifest and fixed lines per track language.
#[cfg(test)]
pub struct MockCaptionSource {
    manifest: Result<Vec<CaptionTrack>, CaptionSourceError>,
    lines: Result<Vec<String>, CaptionSourceError>,
}

#[cfg(test)]
impl MockCaptionSource {
    /// Manifest succeeds with `tracks`; every `lines` call returns `lines`.
    pub fn with_tracks(tracks: Vec<CaptionTrack>, lines: Vec<String>) -> Self {
        Self {
            manifest: Ok(tracks),
            lines: Ok(lines),
        }
    }

    /// Manifest always fails with a transport error.
    pub fn failing(message: &str) -> Self {
        Self {
            manifest: Err(CaptionSourceError(message.into())),
            lines: Err(CaptionSourceError(message.into())),
        }
    }

    /// Manifest succeeds but fetching any track's lines fails.
    pub fn failing_lines(tracks: Vec<CaptionTrack>, message: &str) -> Self {
        Self {
            manifest: Ok(tracks),
            lines: Err(CaptionSourceError(message.into())),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CaptionSource for MockCaptionSource {
    async fn manifest(&self, _video_id: &str) -> Result<Vec<CaptionTrack>, CaptionSourceError> {
        self.manifest.clone()
    }

    async fn lines(&self, _track: &CaptionTrack) -> Result<Vec<String>, CaptionSourceError> {
        self.lines.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
