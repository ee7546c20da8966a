//! Title recognition backends.

use async_trait::async_trait;
use tracing::debug;

use crate::llm::{ChatClient, CompletionOptions};

const MAX_TOKENS: u32 = 100;

const SYSTEM_PROMPT: &str = "You identify films from messy video file names. \
Reply with the official English title of the film and nothing else: no year, \
no quotes, no explanation. If the film cannot be identified, reply with the \
single word unknown.";

/// Turns a cleaned file name into a canonical title.
#[async_trait]
pub trait TitleRecognizer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the service answered but did not know the title.
    async fn recognize(&self, cleaned: &str) -> anyhow::Result<Option<String>>;
}

/// Recognizer backed by an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct LlmTitleRecognizer {
    client: ChatClient,
}

impl LlmTitleRecognizer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TitleRecognizer for LlmTitleRecognizer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn recognize(&self, cleaned: &str) -> anyhow::Result<Option<String>> {
        let prompt = format!("File name: {cleaned}");
        let reply = self
            .client
            .complete(
                SYSTEM_PROMPT,
                &prompt,
                CompletionOptions {
                    max_tokens: Some(MAX_TOKENS),
                    json: false,
                },
            )
            .await?;

        debug!(query = %cleaned, reply = %reply, "Title recognizer replied");
        Ok(interpret_reply(&reply))
    }
}

/// Drop one sentence-final period, leaving an ellipsis alone.
fn strip_sentence_period(title: &str) -> &str {
    match title.strip_suffix('.') {
        Some(rest) if !rest.ends_with('.') => rest.trim_end(),
        _ => title,
    }
}

/// Map a raw reply to a title. Empty replies and the `unknown` sentinel
/// become `None`.
pub(crate) fn interpret_reply(reply: &str) -> Option<String> {
    let title = reply
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim();
    let title = strip_sentence_period(title);

    if title.is_empty() {
        return None;
    }
    let lower = title.to_lowercase();
    if matches!(lower.as_str(), "unknown" | "n/a" | "none" | "null") {
        return None;
    }
    Some(title.to_string())
}
