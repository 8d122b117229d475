//! Summarization prompt table.
//!
//! The system prompt is selected by exact match on the ISO-639-1 language
//! code; anything outside the table falls back to a neutral instruction.

/// System prompt for the given summary language.
pub fn system_prompt(language_code: &str) -> &'static str {
    match language_code {
        "ko" => {
            "당신은 유용한 비서입니다. 주어진 텍스트의 핵심 내용을 3~5개의 \
             글머리 기호로 간결하게 요약해 주세요. 한국어로 응답하세요."
        }
        "en" => {
            "You are a helpful assistant. Summarize the key points of the given \
             text in 3 to 5 bullet points. Be concise."
        }
        _ => {
            "You are a helpful assistant. Summarize the key points of the given \
             text in 3 to 5 bullet points."
        }
    }
}

/// User message embedding the transcript verbatim.
///
/// No truncation happens here; an oversized transcript is the remote
/// service's call to reject.
pub fn user_message(transcript: &str) -> String {
    format!("Summarize the following transcript:\n\n{transcript}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_prompt_asks_for_korean() {
        assert!(system_prompt("ko").contains("한국어"));
    }

    #[test]
    fn english_prompt_asks_for_concision() {
        assert!(system_prompt("en").contains("Be concise"));
    }

    #[test]
    fn unknown_language_gets_neutral_prompt() {
        let neutral = system_prompt("ja");
        assert_eq!(neutral, system_prompt("fr"));
        assert!(neutral.contains("bullet points"));
        assert!(!neutral.contains("Be concise"));
    }

    #[test]
    fn selection_is_exact_match_not_prefix() {
        // "ko-KR" is not in the table; it must fall back to neutral.
        assert_eq!(system_prompt("ko-KR"), system_prompt("unknown"));
    }

    #[test]
    fn user_message_embeds_transcript_verbatim() {
        let msg = user_message("hello world");
        assert!(msg.ends_with("hello world"));
    }
}
