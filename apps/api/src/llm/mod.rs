//! Chat model client — the single point of entry for all LLM calls in the API.
//!
//! ARCHITECTURAL RULE: No other module may call the upstream provider directly.
//! All LLM interactions MUST go through the `ChatModel` trait.
//!
//! The concrete backend is any OpenAI-compatible chat-completions endpoint;
//! provider, model name, credentials and timeout come from the `model_config`
//! table via `ModelConfigProvider` (60s TTL cache).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod handlers;
pub mod settings;

use settings::ModelConfigProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned empty content")]
    EmptyContent,

    #[error("model configuration error: {0}")]
    Config(String),
}

/// The seam between the pipeline and the upstream text-generation capability.
///
/// The pipeline stages depend on this trait, never on the concrete client,
/// so tests can substitute a scripted stub and count invocations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends one system + user message pair and returns the raw text reply.
    async fn invoke(&self, system: &str, user: &str, temperature: f32)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI-compatible chat-completions client.
///
/// Holds no credentials itself — every call re-reads `ModelSettings` from the
/// provider so configuration updates take effect within one cache TTL.
pub struct OpenAiChatModel {
    client: Client,
    provider: ModelConfigProvider,
}

impl OpenAiChatModel {
    pub fn new(provider: ModelConfigProvider) -> Self {
        Self {
            // Per-request timeout comes from ModelSettings, not the builder.
            client: Client::new(),
            provider,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn invoke(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let settings = self.provider.get().await?;

        let url = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );

        let request_body = ChatRequest {
            model: &settings.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&settings.api_key)
            .timeout(settings.timeout)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_chat_response_extracts_first_choice() {
        let json = r#"{
            "choices": [{"message": {"content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_chat_response_tolerates_missing_usage() {
        let json = r#"{"choices": [{"message": {"content": "hi"}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.usage.is_none());
    }
}
