//! Core `Summarizer` trait and `OpenAiSummarizer` implementation.
//!
//! `OpenAiSummarizer` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint. All connection details come from [`SummaryConfig`]; the HTTP
//! client is injected by the composition root so the whole process shares
//! one connection pool.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::config::SummaryConfig;
use crate::summarize::prompt::{system_prompt, user_message};

/// Returned in place of a summary when the remote response carried no usable
/// content. A degraded-but-successful outcome, not an error.
pub const EMPTY_RESPONSE_FALLBACK: &str = "(The summarization service returned no content.)";

// ---------------------------------------------------------------------------
// SummarizeError
// ---------------------------------------------------------------------------

/// Errors that can occur during summarization.
#[derive(Debug, Clone, Error)]
pub enum SummarizeError {
    /// No API key (or a blank one) was configured. Checked before any
    /// network I/O.
    #[error("no API key configured for summarization")]
    MissingCredential,

    /// The run was cancelled while the request was in flight.
    #[error("summarization cancelled")]
    Cancelled,

    /// Transport failure, non-success status, or an unparseable response.
    #[error("summarization request failed: {0}")]
    Remote(String),
}

// ---------------------------------------------------------------------------
// Summarizer trait
// ---------------------------------------------------------------------------

/// Async interface for transcript summarization.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Summarizer>`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `transcript` into a short bulleted text.
    ///
    /// `language_code` selects the system prompt (exact match on the prompt
    /// table; anything else falls back to a neutral instruction).
    async fn summarize(
        &self,
        transcript: &str,
        language_code: &str,
        cancel: &CancelToken,
    ) -> Result<String, SummarizeError>;
}

// ---------------------------------------------------------------------------
// OpenAiSummarizer
// ---------------------------------------------------------------------------

/// Chat-completions summarization client.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    config: SummaryConfig,
}

impl OpenAiSummarizer {
    /// Build a summarizer over an injected HTTP client.
    pub fn new(client: reqwest::Client, config: SummaryConfig) -> Self {
        Self { client, config }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Extract `choices[0].message.content` from a chat-completion response.
fn content_from_response(response: &serde_json::Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A response with no usable content degrades to the fixed fallback string
/// rather than an error.
fn summary_from_response(response: &serde_json::Value) -> String {
    content_from_response(response).unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string())
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        language_code: &str,
        cancel: &CancelToken,
    ) -> Result<String, SummarizeError> {
        // Defensive double-check: the pipeline gates on credential presence
        // before ever reaching this stage.
        let Some(key) = self.api_key() else {
            return Err(SummarizeError::MissingCredential);
        };

        if cancel.is_cancelled() {
            return Err(SummarizeError::Cancelled);
        }

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt(language_code) },
                { "role": "user",   "content": user_message(transcript)     }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        log::debug!(
            "summarize: POST {url} (model {}, {} transcript chars)",
            self.config.model,
            transcript.len()
        );

        let request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .bearer_auth(key)
            .json(&body);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
            result = request.send() => {
                result
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| SummarizeError::Remote(e.to_string()))?
            }
        };

        let json: serde_json::Value = tokio::select! {
            _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
            result = response.json() => {
                result.map_err(|e| SummarizeError::Remote(e.to_string()))?
            }
        };

        Ok(summary_from_response(&json))
    }
}

// ---------------------------------------------------------------------------
// MockSummarizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double with a fixed response, counting invocations.
#[cfg(test)]
pub struct MockSummarizer {
    response: Result<String, SummarizeError>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSummarizer {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn err(error: SummarizeError) -> Self {
        Self {
            response: Err(error),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        _transcript: &str,
        _language_code: &str,
        cancel: &CancelToken,
    ) -> Result<String, SummarizeError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(SummarizeError::Cancelled);
        }
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryConfig;

    fn make_summarizer(api_key: Option<&str>) -> OpenAiSummarizer {
        let config = SummaryConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..SummaryConfig::default()
        };
        OpenAiSummarizer::new(reqwest::Client::new(), config)
    }

    // ---- credential precondition ---

    #[tokio::test]
    async fn missing_key_fails_without_network_call() {
        let summarizer = make_summarizer(None);
        let cancel = CancelToken::new();

        let err = summarizer
            .summarize("hello world", "en", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MissingCredential));
    }

    #[tokio::test]
    async fn blank_key_fails_without_network_call() {
        let summarizer = make_summarizer(Some("   "));
        let cancel = CancelToken::new();

        let err = summarizer
            .summarize("hello world", "en", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MissingCredential));
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let summarizer = make_summarizer(Some("sk-test"));
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = summarizer
            .summarize("hello world", "en", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Cancelled));
    }

    // ---- response content extraction ---

    #[test]
    fn extracts_first_choice_content() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "- point one\n- point two" } }
            ]
        });
        assert_eq!(
            content_from_response(&json).as_deref(),
            Some("- point one\n- point two")
        );
    }

    #[test]
    fn missing_content_yields_none() {
        let json = serde_json::json!({ "choices": [] });
        assert!(content_from_response(&json).is_none());
    }

    #[test]
    fn whitespace_content_yields_none() {
        let json = serde_json::json!({
            "choices": [ { "message": { "content": "   " } } ]
        });
        assert!(content_from_response(&json).is_none());
    }

    #[test]
    fn contentless_response_degrades_to_fallback() {
        let json = serde_json::json!({ "choices": [] });
        assert_eq!(summary_from_response(&json), EMPTY_RESPONSE_FALLBACK);
    }

    #[test]
    fn successful_response_is_not_the_fallback() {
        let json = serde_json::json!({
            "choices": [ { "message": { "content": "- a real summary" } } ]
        });
        assert_eq!(summary_from_response(&json), "- a real summary");
    }

    // ---- trait object safety ---

    #[test]
    fn summarizer_is_object_safe() {
        let s: Box<dyn Summarizer> = Box::new(make_summarizer(None));
        drop(s);
    }

    // ---- MockSummarizer ---

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockSummarizer::ok("- summary");
        let cancel = CancelToken::new();

        let text = mock.summarize("t", "en", &cancel).await.unwrap();
        assert_eq!(text, "- summary");
        assert_eq!(mock.call_count(), 1);
    }
}
