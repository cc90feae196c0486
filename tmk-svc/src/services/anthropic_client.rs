//! Anthropic Messages API client
//!
//! The only text-generation backend. Single attempt per call: no
//! retry, no streaming; failures surface to the caller as external
//! service errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use tmk_common::{Error, Result};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Anthropic client errors
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// API returned a non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Response body missing the expected text content
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<AnthropicError> for Error {
    fn from(e: AnthropicError) -> Self {
        Error::ExternalService(e.to_string())
    }
}

/// One text-generation request: a system instruction plus a single
/// user message.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Text-generation collaborator seam. Production uses the Anthropic
/// client; tests substitute scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a single text blob for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Model identifier recorded alongside generated artifacts.
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [MessageBody<'a>; 1],
}

#[derive(Serialize)]
struct MessageBody<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AnthropicError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model,
        })
    }

    async fn call_messages(&self, request: &GenerationRequest) -> std::result::Result<String, AnthropicError> {
        let url = format!("{}/messages", ANTHROPIC_BASE_URL);
        let body = MessagesBody {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [MessageBody {
                role: "user",
                content: &request.user,
            }],
        };

        tracing::debug!(model = %self.model, max_tokens = request.max_tokens, "Calling Anthropic Messages API");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnthropicError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnthropicError::ApiError(status.as_u16(), error_text));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AnthropicError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.clone())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnthropicError::MalformedResponse(
                "Response contained no text content".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let text = self.call_messages(request).await?;
        tracing::info!(model = %self.model, chars = text.len(), "Text generation successful");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new("key".to_string(), "claude-3-5-sonnet-20241022".to_string());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model(), "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesBody {
            model: "claude-3-5-sonnet-20241022",
            max_tokens: 1000,
            system: "sys",
            messages: [MessageBody {
                role: "user",
                content: "hello",
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"content":[{"type":"text","text":"42"}],"model":"m"}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text, "42");
    }
}
