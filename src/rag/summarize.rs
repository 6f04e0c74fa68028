//! Map-reduce summarization for oversized source text.
//!
//! Artifact generation (reports, quizzes, podcasts) feeds whole-notebook
//! text into one prompt; when that text would blow the context window it
//! is compressed first: split into fixed-size character windows, each
//! summarized independently, summaries concatenated. Best-effort by
//! contract — a failed window degrades to a raw excerpt and the caller
//! never sees an error.

use crate::config::EngineConfig;
use crate::llm::LlmClient;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a concise summarizer. Condense the text you are given to its key points \
     in a few short paragraphs.";

/// Raw characters kept from a window whose summarization failed.
const FAILED_WINDOW_EXCERPT_CHARS: usize = 1000;

/// Rough token estimate: 4 characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Compress `text` if its estimated token count exceeds the configured
/// threshold; otherwise return it unchanged.
pub async fn reduce_if_needed(llm: &LlmClient, config: &EngineConfig, text: &str) -> String {
    if estimate_tokens(text) <= config.summary_token_threshold {
        return text.to_string();
    }

    let windows = char_windows(text, config.summary_window_chars);
    tracing::info!(windows = windows.len(), "map-reduce summarizing source text");

    let mut reduced = String::new();
    for (i, window) in windows.iter().enumerate() {
        let prompt = format!("Summarize the following text:\n\n{window}");
        match llm
            .complete(&prompt, Some(SUMMARY_SYSTEM_PROMPT), Some(0.2), None)
            .await
        {
            Ok(response) => {
                reduced.push_str(&response.text);
                reduced.push_str("\n\n");
            }
            Err(err) => {
                tracing::warn!(window = i, error = %err, "window summarization failed, keeping a raw excerpt");
                reduced.push_str(truncate_chars(window, FAILED_WINDOW_EXCERPT_CHARS));
                reduced.push_str("\n\n");
            }
        }
    }

    reduced.trim_end().to_string()
}

/// Split on character boundaries into windows of at most `size` chars.
fn char_windows(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            windows.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        windows.push(&text[start..]);
    }
    windows
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
