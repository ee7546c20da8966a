//! Minimal client for OpenAI-compatible chat completion endpoints.
//!
//! Used by the title recognizer and the generative metadata source. Calls are
//! single-attempt; callers decide what a failure means.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    /// Ask the endpoint for a JSON object reply.
    pub json: bool,
}

/// Chat completion client bound to one endpoint and model.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Build a client from config. Returns `None` when no API key is set.
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(Self::new(
            &config.base_url,
            api_key,
            &config.model,
            config.temperature,
        ))
    }

    pub fn new(base_url: &str, api_key: &str, model: &str, temperature: f32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    /// Same endpoint, different model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a system + user prompt and return the trimmed reply text.
    ///
    /// An empty reply is returned as an empty string, not an error.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(url = %url, model = %self.model, "Chat completion request");

        let response: ChatResponse = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("chat request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("chat endpoint returned error: {url}"))?
            .json()
            .await
            .context("failed to parse chat completion response")?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_from_config_requires_key() {
        let mut config = LlmConfig::default();
        assert!(ChatClient::from_config(&config).is_none());

        config.api_key = Some("  ".into());
        assert!(ChatClient::from_config(&config).is_none());

        config.api_key = Some("sk-test".into());
        let client = ChatClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "deepseek-chat");
    }

    #[tokio::test]
    async fn test_complete_sends_prompt_and_trims_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "m",
                "max_tokens": 100
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Heat \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), "sk-test", "m", 0.2);
        let reply = client
            .complete(
                "sys",
                "hello",
                CompletionOptions {
                    max_tokens: Some(100),
                    json: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(reply, "Heat");
    }

    #[tokio::test]
    async fn test_json_mode_sets_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), "k", "m", 0.2);
        let reply = client
            .complete(
                "s",
                "u",
                CompletionOptions {
                    max_tokens: None,
                    json: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(reply, "{}");
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri(), "k", "m", 0.2);
        assert!(client
            .complete("s", "u", CompletionOptions::default())
            .await
            .is_err());
    }
}
