//! Remote transcript summarization.
//!
//! This module provides:
//! * [`Summarizer`] — async trait the pipeline drives.
//! * [`OpenAiSummarizer`] — chat-completions client (OpenAI or any
//!   compatible endpoint; all connection details come from
//!   [`SummaryConfig`]).
//! * [`system_prompt`] / [`user_message`] — the language-keyed prompt table.
//! * [`SummarizeError`] — error variants for the summarization stage.
//!
//! [`SummaryConfig`]: crate::config::SummaryConfig

pub mod client;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{OpenAiSummarizer, SummarizeError, Summarizer, EMPTY_RESPONSE_FALLBACK};
pub use prompt::{system_prompt, user_message};

#[cfg(test)]
pub use client::MockSummarizer;
