//! Best-track selection and caption text fetch.
//!
//! The pipeline calls [`fetch_best_caption_text`] once per run (when a video
//! identifier is known) and falls back to speech recognition on anything but
//! success.

use thiserror::Error;

use crate::cancel::CancelToken;
use crate::captions::source::{CaptionSource, CaptionTrack};

// ---------------------------------------------------------------------------
// CaptionError
// ---------------------------------------------------------------------------

/// Classified outcome of a caption fetch.
///
/// `NotFound` and `Transient` both mean "fall back to speech recognition";
/// they are distinct so the status narration can tell absence from a network
/// hiccup, and so programmer errors are not silently swallowed.
#[derive(Debug, Clone, Error)]
pub enum CaptionError {
    /// The video has no caption tracks at all.
    #[error("no caption tracks available")]
    NotFound,

    /// The run was cancelled while fetching captions.
    #[error("caption fetch cancelled")]
    Cancelled,

    /// Transport failure while fetching the manifest or the track text.
    #[error("caption fetch failed: {0}")]
    Transient(String),
}

// ---------------------------------------------------------------------------
// Track selection
// ---------------------------------------------------------------------------

/// Pick the best track: two-key descending sort on (starts-with `"ko"`,
/// starts-with `"en"`), manifest order breaking ties.
///
/// Returns `None` when `tracks` is empty.
pub fn select_best_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    // min_by_key returns the first minimum, which preserves manifest order
    // among equally-ranked tracks; the keys are inverted accordingly.
    tracks.iter().min_by_key(|t| {
        (
            !t.language_code.starts_with("ko"),
            !t.language_code.starts_with("en"),
        )
    })
}

// ---------------------------------------------------------------------------
// fetch_best_caption_text
// ---------------------------------------------------------------------------

/// Fetch the text of the best caption track for `video_id`.
///
/// On success returns the space-joined caption text together with the track
/// it came from. Any transport failure from the [`CaptionSource`] maps to
/// [`CaptionError::Transient`]; an empty manifest maps to
/// [`CaptionError::NotFound`]. Cancellation is observed before and during
/// both network calls.
pub async fn fetch_best_caption_text(
    source: &dyn CaptionSource,
    video_id: &str,
    cancel: &CancelToken,
) -> Result<(String, CaptionTrack), CaptionError> {
    if cancel.is_cancelled() {
        return Err(CaptionError::Cancelled);
    }

    let tracks = tokio::select! {
        _ = cancel.cancelled() => return Err(CaptionError::Cancelled),
        result = source.manifest(video_id) => {
            result.map_err(|e| CaptionError::Transient(e.to_string()))?
        }
    };

    let track = match select_best_track(&tracks) {
        Some(track) => track.clone(),
        None => return Err(CaptionError::NotFound),
    };

    log::debug!(
        "captions: selected track {} ({}) for video {video_id}",
        track.language_code,
        track.display_name
    );

    let lines = tokio::select! {
        _ = cancel.cancelled() => return Err(CaptionError::Cancelled),
        result = source.lines(&track) => {
            result.map_err(|e| CaptionError::Transient(e.to_string()))?
        }
    };

    Ok((lines.join(" "), track))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::source::MockCaptionSource;

    fn ko() -> CaptionTrack {
        CaptionTrack::new("ko", "Korean", false)
    }

    fn en() -> CaptionTrack {
        CaptionTrack::new("en", "English", false)
    }

    fn ja() -> CaptionTrack {
        CaptionTrack::new("ja", "Japanese", false)
    }

    // ---- select_best_track ---

    #[test]
    fn korean_beats_english() {
        let tracks = vec![en(), ko()];
        let best = select_best_track(&tracks).unwrap();
        assert_eq!(best.language_code, "ko");
    }

    #[test]
    fn english_beats_other() {
        let tracks = vec![ja(), en()];
        let best = select_best_track(&tracks).unwrap();
        assert_eq!(best.language_code, "en");
    }

    #[test]
    fn regional_codes_match_by_prefix() {
        let tracks = vec![
            CaptionTrack::new("en-US", "English (US)", false),
            CaptionTrack::new("ko-KR", "Korean", true),
        ];
        let best = select_best_track(&tracks).unwrap();
        assert_eq!(best.language_code, "ko-KR");
    }

    #[test]
    fn manifest_order_breaks_ties() {
        let first = CaptionTrack::new("ja", "Japanese", false);
        let second = CaptionTrack::new("de", "German", false);
        let tracks = vec![first.clone(), second];
        let best = select_best_track(&tracks).unwrap();
        assert_eq!(*best, first);
    }

    #[test]
    fn empty_manifest_selects_nothing() {
        assert!(select_best_track(&[]).is_none());
    }

    // ---- fetch_best_caption_text ---

    #[tokio::test]
    async fn joins_lines_with_spaces() {
        let source = MockCaptionSource::with_tracks(
            vec![ko()],
            vec!["안녕하세요".into(), "여러분".into()],
        );
        let cancel = CancelToken::new();

        let (text, track) = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap();

        assert_eq!(text, "안녕하세요 여러분");
        assert_eq!(track.language_code, "ko");
    }

    #[tokio::test]
    async fn korean_track_preferred_over_english() {
        let source =
            MockCaptionSource::with_tracks(vec![en(), ko()], vec!["caption text".into()]);
        let cancel = CancelToken::new();

        let (_, track) = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap();
        assert_eq!(track.language_code, "ko");
    }

    #[tokio::test]
    async fn empty_manifest_is_not_found() {
        let source = MockCaptionSource::with_tracks(vec![], vec![]);
        let cancel = CancelToken::new();

        let err = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::NotFound));
    }

    #[tokio::test]
    async fn manifest_failure_is_transient() {
        let source = MockCaptionSource::failing("503 from platform");
        let cancel = CancelToken::new();

        let err = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::Transient(_)));
    }

    #[tokio::test]
    async fn line_fetch_failure_is_transient() {
        let source = MockCaptionSource::failing_lines(vec![ko()], "timed out");
        let cancel = CancelToken::new();

        let err = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::Transient(_)));
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let source = MockCaptionSource::with_tracks(vec![ko()], vec!["text".into()]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = fetch_best_caption_text(&source, "abc123", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::Cancelled));
    }
}
