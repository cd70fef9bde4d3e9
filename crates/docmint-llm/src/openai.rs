//! OpenAI-compatible Provider Implementation
//!
//! Talks to any service exposing the `/chat/completions` endpoint (OpenAI,
//! Azure-style gateways, vLLM, LiteLLM, ...).
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Configurable base URL, API key and model
//! - Per-request timeout
//!
//! One call is one attempt; retries are handled by
//! [`ExtractionClient`](crate::ExtractionClient).
//!
//! # Examples
//!
//! ```no_run
//! use docmint_llm::{OpenAiProvider, ProviderConfig};
//!
//! let config = ProviderConfig::from_env();
//! let provider = OpenAiProvider::new(config).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use docmint_domain::traits::{ChatProvider, ChatRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default timeout for a single request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the base URL
pub const BASE_URL_ENV: &str = "OPENAI_API_URL";

/// Connection settings for the model service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL, without the `/chat/completions` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (never written back to disk)
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for a single request (seconds)
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Defaults overridden by `OPENAI_API_KEY` / `OPENAI_API_URL`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `OPENAI_API_KEY` / `OPENAI_API_URL` when they are set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        self
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of the chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.api_key.trim().is_empty() {
            return Err(format!("api_key is missing (set {})", API_KEY_ENV));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
        }
    }
}

fn first_choice_content(response: ChatCompletionResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response contained no message content".to_string()))
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Communication(format!(
                        "Request timed out after {}s",
                        self.config.request_timeout_secs
                    ))
                } else {
                    LlmError::Communication(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        first_choice_content(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new(config("http://localhost:8000/v1")).unwrap();
        assert_eq!(provider.config().model, DEFAULT_MODEL);
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_completions_url_handles_trailing_slash() {
        assert_eq!(
            config("http://localhost:8000/v1/").completions_url(),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            config(DEFAULT_BASE_URL).completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut cfg = config(DEFAULT_BASE_URL);
        assert!(cfg.validate().is_ok());

        cfg.api_key.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let json = serde_json::to_string(&config(DEFAULT_BASE_URL)).unwrap();
        assert!(!json.contains("sk-test"));
    }

    #[test]
    fn test_request_body_shape() {
        let provider = OpenAiProvider::new(config(DEFAULT_BASE_URL)).unwrap();
        let request = ChatRequest::new("You are an EDA expert", "segment text");
        let body = serde_json::to_value(provider.request_body(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are an EDA expert");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "segment text");
    }

    #[test]
    fn test_parse_first_choice() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_choice_content(parsed).unwrap(), "hi");
    }

    #[test]
    fn test_parse_empty_choices_is_invalid() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice_content(parsed),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let provider = OpenAiProvider::new(config("http://localhost:99999/v1")).unwrap();
        let result = provider.complete(&ChatRequest::new("sys", "user")).await;

        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }
}
