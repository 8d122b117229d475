//! Audio front-end: media normalisation and WAV decoding.
//!
//! Whisper wants 16 kHz mono f32 PCM. Arbitrary input media (video
//! containers, compressed audio) goes through `ffmpeg` first; the resulting
//! WAV is decoded with `hound`.

use std::path::Path;

use tokio::process::Command;

use crate::cancel::CancelToken;
use crate::transcribe::engine::TranscribeError;

/// Sample rate Whisper models are trained on.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Extract/normalise `input` into a 16 kHz mono s16 WAV at `output`.
///
/// Runs `ffmpeg` as a subprocess; the process is killed if the run is
/// cancelled while it executes.
pub async fn extract_audio(
    input: &Path,
    output: &Path,
    cancel: &CancelToken,
) -> Result<(), TranscribeError> {
    if cancel.is_cancelled() {
        return Err(TranscribeError::Cancelled);
    }

    let mut command = Command::new("ffmpeg");
    command
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(WHISPER_SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg("1")
        .arg(output)
        .kill_on_drop(true);

    let output_result = tokio::select! {
        _ = cancel.cancelled() => return Err(TranscribeError::Cancelled),
        result = command.output() => result,
    };

    let output_result = output_result.map_err(|e| {
        TranscribeError::Audio(format!("failed to run ffmpeg: {e}"))
    })?;

    if !output_result.status.success() {
        return Err(TranscribeError::Audio(format!(
            "ffmpeg failed for {}: {}",
            input.display(),
            String::from_utf8_lossy(&output_result.stderr)
        )));
    }

    Ok(())
}

/// Decode a 16-bit PCM WAV file into normalised f32 samples.
pub fn read_wav_samples(path: &Path) -> Result<Vec<f32>, TranscribeError> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| TranscribeError::Audio(e.to_string()))?;

    reader
        .samples::<i16>()
        .map(|s| {
            s.map(|sample| sample as f32 / i16::MAX as f32)
                .map_err(|e| TranscribeError::Audio(e.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
