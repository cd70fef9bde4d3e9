//! Error types for the Extractor

use docmint_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// A source file could not be read or parsed
    #[error("Ingestion failed for {}: {reason}", .path.display())]
    Ingestion {
        /// File that failed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Model service failure that outlived the transport retry policy
    #[error("Transport failure: {0}")]
    Transport(#[from] LlmError),

    /// Response contained no fenced structured block
    #[error("No structured block found in response")]
    NoStructuredBlockFound,

    /// Fenced block did not parse or did not match the expected shape
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// Prompt template registration or rendering problem
    #[error("Template error: {0}")]
    Template(String),

    /// Record store error
    #[error("Sink error: {0}")]
    Sink(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error outside of per-file ingestion
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Build an ingestion failure
    pub fn ingestion(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ExtractorError::Ingestion {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::MalformedData(format!("JSON parse error: {}", e))
    }
}
