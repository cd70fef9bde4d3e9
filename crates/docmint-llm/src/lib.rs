//! Docmint LLM Provider Layer
//!
//! Model-service boundary for the extraction pipeline.
//!
//! # Architecture
//!
//! This crate provides implementations of the `ChatProvider` trait from
//! `docmint-domain` and the `ExtractionClient` that wraps a provider with the
//! transport retry policy.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions endpoint
//!
//! # Examples
//!
//! ```
//! use docmint_llm::{ExtractionClient, MockProvider, RetryPolicy};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = ExtractionClient::new(MockProvider::new("Hello from LLM!"), RetryPolicy::default());
//! let result = client.complete("system", "user").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod cancel;
pub mod client;
pub mod openai;

use async_trait::async_trait;
use docmint_domain::traits::{ChatProvider, ChatRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use cancel::Cancellation;
pub use client::{ExtractionClient, RetryPolicy};
pub use openai::{OpenAiProvider, ProviderConfig};

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The run was cancelled while the request was pending
    #[error("Request cancelled")]
    Cancelled,

    /// Transport retries exhausted
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: String,
    },

    /// Provider misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. Replies
/// are chosen in this order: queued replies (FIFO), then the first registered
/// response whose key is contained in the system prompt, then the default.
///
/// # Examples
///
/// ```
/// use docmint_llm::{ExtractionClient, MockProvider, RetryPolicy};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("judge", "no");
/// provider.push_response("first");
///
/// let client = ExtractionClient::new(provider.clone(), RetryPolicy::default());
/// assert_eq!(client.complete("you judge", "text").await.unwrap(), "first");
/// assert_eq!(client.complete("you judge", "text").await.unwrap(), "no");
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    queue: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` whenever the system prompt contains `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((key.into(), MockReply::Text(response.into())));
    }

    /// Fail whenever the system prompt contains `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        lock(&self.responses).push((key.into(), MockReply::Error("Mock error".to_string())));
    }

    /// Queue a one-shot response
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(MockReply::Text(response.into()));
    }

    /// Queue a one-shot transport failure
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(MockReply::Error(message.into()));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Reset the recorded requests
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }

    fn reply_for(&self, request: &ChatRequest) -> MockReply {
        if let Some(reply) = lock(&self.queue).pop_front() {
            return reply;
        }

        lock(&self.responses)
            .iter()
            .find(|(key, _)| request.system_prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        lock(&self.requests).push(request.clone());

        match self.reply_for(request) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(LlmError::Communication(message)),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
