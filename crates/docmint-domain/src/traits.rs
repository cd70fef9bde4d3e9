//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and infrastructure.
//! Implementations live in other crates.

use crate::record::ExtractionRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single chat-style request: system prompt plus user content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Instantiated system prompt
    pub system_prompt: String,

    /// User content (normally the segment text)
    pub user_prompt: String,
}

impl ChatRequest {
    /// Create a new request
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

/// Trait for the hosted language-model service
///
/// One call is one attempt; retry policy belongs to the caller.
/// Implemented by the infrastructure layer (docmint-llm).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Error type for a failed attempt
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send the request and return the raw response text
    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Trait for append-only record storage
///
/// Implementations must serialize concurrent appends so each stored record
/// stays syntactically complete.
/// Implemented by the application layer (docmint-extractor).
pub trait RecordSink: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one record
    fn append(&self, record: &ExtractionRecord) -> Result<(), Self::Error>;
}
