//! Docmint Extractor
//!
//! Turns tool documentation into line-delimited training records.
//!
//! # Overview
//!
//! Documents are discovered and read by the [`Ingestor`], split into
//! overlapping segments by the [`TextChunker`], and shuffled. Each segment is
//! then sent to the model with a task-specific system prompt
//! ([`PromptRouter`]), the response is validated ([`validate_response`]) and
//! re-requested a bounded number of times when it is unusable, and the
//! resulting records are appended to a [`RecordSink`](docmint_domain::RecordSink).
//!
//! # Architecture
//!
//! ```text
//! Ingestor → TextChunker → shuffle → [gate] → extract → validate → Sink
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use docmint_extractor::{ExtractorConfig, Ingestor, MemorySink, Pipeline, Workflow};
//! use docmint_llm::{ExtractionClient, MockProvider, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let client = ExtractionClient::new(MockProvider::new("```json\n[]\n```"), RetryPolicy::default());
//! let pipeline = Pipeline::new(Workflow::Qa, client, MemorySink::new(), config.clone())?;
//!
//! let ingestor = Ingestor::new("./data", config.known_projects.clone());
//! let report = pipeline.run_corpus(&ingestor).await;
//!
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod ingest;
mod parser;
mod pipeline;
mod prompt;
mod reformat;
mod sink;
mod types;


pub use chunking::{reassemble, TextChunker, SEPARATORS};
pub use config::{ExhaustedPolicy, ExtractorConfig, DEFAULT_KNOWN_PROJECTS};
pub use error::ExtractorError;
pub use ingest::{html_to_text, infer_source_label, markdown_to_text, pdf_to_text, Ingestor};
pub use parser::{extract_structured_block, validate_response, Validated};
pub use pipeline::Pipeline;
pub use prompt::{
    standard_template, PromptRouter, PromptTemplate, GENERIC_TOOL_NAME, STRUCTURED_RESPONSE_SUFFIX,
    TOOL_SLOT,
};
pub use reformat::{discover_tables, read_table, TableKind, TabularCorpus};
pub use sink::{JsonlSink, MemorySink};
pub use types::{AttemptState, RunReport, SegmentOutcome, SegmentStatus, Workflow};
