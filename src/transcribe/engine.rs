//! Core transcription trait and the Whisper implementation.
//!
//! [`Transcriber`] is the interface the pipeline drives. It is object-safe
//! and `Send + Sync` so it can sit behind an `Arc<dyn Transcriber>`.
//!
//! [`WhisperTranscriber`] is the production implementation wrapping
//! `whisper_rs`. [`MockTranscriber`] (under `#[cfg(test)]`) replays scripted
//! segments so the pipeline can be unit-tested without a model file.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use whisper_rs::{
    FullParams, SamplingStrategy, SegmentCallbackData, WhisperContext, WhisperContextParameters,
};

use crate::cancel::CancelToken;
use crate::model::{ModelCache, ModelVariant};
use crate::transcribe::audio;

// ---------------------------------------------------------------------------
// TranscribeError
// ---------------------------------------------------------------------------

/// All errors that can arise from the transcription subsystem.
#[derive(Debug, Clone, Error)]
pub enum TranscribeError {
    /// The model file for the requested variant is not in the cache. The
    /// engine never downloads implicitly; callers go through
    /// [`ModelCache::ensure_downloaded`] first.
    #[error("speech model not found: {0}")]
    ModelMissing(String),

    /// The run was cancelled; no partial transcript is returned.
    #[error("transcription cancelled")]
    Cancelled,

    /// Failed to normalise or decode the input media.
    #[error("audio processing failed: {0}")]
    Audio(String),

    /// `whisper_rs` failed to load the model or run inference.
    #[error("speech recognition failed: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// SegmentSink
// ---------------------------------------------------------------------------

/// Per-segment progress callback.
///
/// Invoked synchronously with the 1-based running segment count, strictly
/// increasing, before the segment's text is appended to the transcript, and
/// never after `transcribe` has returned. Implementations must not block —
/// hand anything slow to a channel.
pub type SegmentSink = Arc<dyn Fn(usize) + Send + Sync>;

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - The model for `variant` must already be cached; absence is
///   [`TranscribeError::ModelMissing`], not an implicit download.
/// - `language_hint == "auto"` enables language auto-detection; any other
///   value pins the recognizer to that language.
/// - The returned text is the trimmed segments joined with single spaces,
///   in production order.
/// - Cancellation is all-or-nothing: [`TranscribeError::Cancelled`], never
///   a partial transcript.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        file_path: &Path,
        variant: ModelVariant,
        language_hint: &str,
        segments: SegmentSink,
        cancel: &CancelToken,
    ) -> Result<String, TranscribeError>;
}

// ---------------------------------------------------------------------------
// WhisperTranscriber
// ---------------------------------------------------------------------------

/// Production transcriber backed by `whisper_rs`.
///
/// Each call loads the model fresh and creates a per-call `WhisperState`, so
/// one instance can serve concurrent runs without locking.
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    cache: ModelCache,
}

impl WhisperTranscriber {
    pub fn new(cache: ModelCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        file_path: &Path,
        variant: ModelVariant,
        language_hint: &str,
        segments: SegmentSink,
        cancel: &CancelToken,
    ) -> Result<String, TranscribeError> {
        let model_path = self.cache.model_path(variant);
        if !self.cache.is_present(variant) {
            return Err(TranscribeError::ModelMissing(
                model_path.display().to_string(),
            ));
        }

        // ── Normalise input to 16 kHz mono WAV ───────────────────────────
        let workdir = tempfile::tempdir().map_err(|e| TranscribeError::Audio(e.to_string()))?;
        let wav_path = workdir.path().join("audio.wav");
        audio::extract_audio(file_path, &wav_path, cancel).await?;

        // ── Decode samples (blocking → thread pool) ──────────────────────
        let samples = tokio::task::spawn_blocking(move || audio::read_wav_samples(&wav_path))
            .await
            .map_err(|e| TranscribeError::Engine(format!("decode task failed: {e}")))??;

        if cancel.is_cancelled() {
            return Err(TranscribeError::Cancelled);
        }

        // ── Inference (blocking → thread pool) ───────────────────────────
        let model_path_str = model_path
            .to_str()
            .ok_or_else(|| {
                TranscribeError::ModelMissing(format!(
                    "model path contains non-UTF-8 characters: {}",
                    model_path.display()
                ))
            })?
            .to_string();
        let language = language_hint.to_string();
        let cancel_clone = cancel.clone();

        tokio::task::spawn_blocking(move || {
            run_whisper(&model_path_str, &samples, &language, segments, cancel_clone)
        })
        .await
        .map_err(|e| TranscribeError::Engine(format!("inference task failed: {e}")))?
    }
}

/// Blocking inference pass. Runs on the tokio blocking pool.
fn run_whisper(
    model_path: &str,
    samples: &[f32],
    language: &str,
    segments: SegmentSink,
    cancel: CancelToken,
) -> Result<String, TranscribeError> {
    let ctx_params = WhisperContextParameters::default();
    let ctx = WhisperContext::new_with_params(model_path, ctx_params)
        .map_err(|e| TranscribeError::Engine(e.to_string()))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

    // "auto" disables forced-language decoding.
    let lang: Option<&str> = if language == "auto" {
        None
    } else {
        Some(language)
    };
    params.set_language(lang);
    params.set_n_threads(optimal_threads());
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_special(false);

    // Segment callback: report the 1-based count first, then keep the
    // trimmed text. Whisper invokes this sequentially on its own thread, so
    // ordinals are strictly increasing.
    let collected: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let collector = Arc::clone(&collected);
    let counter = AtomicUsize::new(0);
    params.set_segment_callback_safe(move |data: SegmentCallbackData| {
        let ordinal = counter.fetch_add(1, Ordering::SeqCst) + 1;
        segments(ordinal);
        if let Ok(mut texts) = collector.lock() {
            texts.push(data.text.trim().to_string());
        }
    });

    let abort_cancel = cancel.clone();
    params.set_abort_callback_safe(move || abort_cancel.is_cancelled());

    let mut state = ctx
        .create_state()
        .map_err(|e| TranscribeError::Engine(e.to_string()))?;

    state.full(params, samples).map_err(|e| {
        if cancel.is_cancelled() {
            TranscribeError::Cancelled
        } else {
            TranscribeError::Engine(e.to_string())
        }
    })?;

    // The abort callback can fire between decoder steps without failing the
    // run; honour the all-or-nothing contract here too.
    if cancel.is_cancelled() {
        return Err(TranscribeError::Cancelled);
    }

    let texts = collected
        .lock()
        .map_err(|e| TranscribeError::Engine(format!("segment collector poisoned: {e}")))?;
    Ok(texts.join(" "))
}

/// Thread count for inference: all cores, capped at 8 (diminishing returns
/// beyond that for GGML decoding).
fn optimal_threads() -> i32 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cores.min(8) as i32
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Test double that replays scripted segments through the sink and returns
/// their space-joined text, without touching ffmpeg or any model file.
#[cfg(test)]
pub struct MockTranscriber {
    segments: Vec<String>,
    failure: Option<TranscribeError>,
    wait_for_cancel: bool,
    calls: AtomicUsize,
}

#[cfg(test)]
impl MockTranscriber {
    /// Mock that emits `segments` in order and succeeds.
    pub fn with_segments(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            failure: None,
            wait_for_cancel: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that always fails with `error` (after counting the call).
    pub fn failing(error: TranscribeError) -> Self {
        Self {
            segments: Vec::new(),
            failure: Some(error),
            wait_for_cancel: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that parks until the run is cancelled, then honours the
    /// all-or-nothing contract. Used to exercise mid-run cancellation.
    pub fn waiting_for_cancel() -> Self {
        Self {
            segments: Vec::new(),
            failure: None,
            wait_for_cancel: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `transcribe` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _file_path: &Path,
        _variant: ModelVariant,
        _language_hint: &str,
        segments: SegmentSink,
        cancel: &CancelToken,
    ) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        if self.wait_for_cancel {
            cancel.cancelled().await;
        }
        if cancel.is_cancelled() {
            return Err(TranscribeError::Cancelled);
        }

        for (i, _) in self.segments.iter().enumerate() {
            segments(i + 1);
        }
        Ok(self.segments.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
