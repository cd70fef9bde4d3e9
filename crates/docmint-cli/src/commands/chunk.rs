//! Chunk command implementation.

use crate::cli::ChunkArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docmint_domain::UNLABELED_SOURCE;
use docmint_extractor::{Ingestor, TextChunker};
use std::collections::BTreeMap;
use std::path::Path;

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    if !args.input.is_dir() {
        return Err(CliError::Config(format!(
            "Input directory {} does not exist",
            args.input.display()
        )));
    }

    let (counts, documents) = count_segments(&args.input, config);
    println!("{}", formatter.segment_counts(&counts, documents));
    Ok(())
}

/// Segments per source label, and the number of documents read.
fn count_segments(input: &Path, config: &AppConfig) -> (BTreeMap<String, usize>, usize) {
    let ingestor = Ingestor::new(input, config.extractor.known_projects.clone());
    let chunker = TextChunker::new(config.extractor.chunk_size, config.extractor.chunk_overlap);

    let mut counts = BTreeMap::new();
    let mut documents = 0;
    for document in ingestor.documents() {
        documents += 1;
        let segments = chunker.chunk_document(&document);
        if segments.is_empty() {
            continue;
        }
        let label = if document.source_label.is_empty() {
            UNLABELED_SOURCE.to_string()
        } else {
            document.source_label.clone()
        };
        *counts.entry(label).or_insert(0) += segments.len();
    }
    (counts, documents)
}
