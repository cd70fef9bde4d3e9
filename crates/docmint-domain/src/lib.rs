//! Docmint Domain Layer
//!
//! Core data model shared by every docmint crate. Nothing in here performs I/O;
//! the crate defines the value types that flow through the extraction pipeline
//! and the trait boundaries that infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Document**: normalized text of one source file, tagged with a source label
//! - **Segment**: a bounded, possibly overlapping slice of a document, the unit of work
//! - **TaskType**: selects a prompt template and the expected output shape
//! - **ExtractionRecord**: a validated model output enriched with `reference` and `source`
//!
//! ## Architecture
//!
//! - No network, filesystem or runtime dependencies
//! - Infrastructure implementations live in other crates
//! - Trait definitions for the model service and the record store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod record;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use document::{Document, DocumentFormat, Segment};
pub use record::{ExtractionRecord, UNLABELED_SOURCE};
pub use task::TaskType;
pub use traits::{ChatProvider, ChatRequest, RecordSink};
