//! Append-only record storage
//!
//! [`JsonlSink`] writes one JSON object per line and flushes after each
//! line, so a crash leaves at most one incomplete trailing line.
//! [`MemorySink`] keeps records in memory for tests and dry runs.

use crate::error::ExtractorError;
use crate::types::Workflow;
use docmint_domain::{ExtractionRecord, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Line-delimited JSON file opened in append mode
pub struct JsonlSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Open (or create) `path` for appending, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ExtractorError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Appending records to {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Open the output file of `workflow` under `output_dir`
    pub fn for_workflow(output_dir: &Path, workflow: Workflow) -> Result<Self, ExtractorError> {
        Self::open(output_dir.join(workflow.output_file()))
    }

    /// File being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn check_provenance(record: &ExtractionRecord) -> Result<(), ExtractorError> {
    if record.has_provenance() {
        Ok(())
    } else {
        Err(ExtractorError::Sink(
            "record is missing its reference or source".to_string(),
        ))
    }
}

impl RecordSink for JsonlSink {
    type Error = ExtractorError;

    fn append(&self, record: &ExtractionRecord) -> Result<(), Self::Error> {
        check_provenance(record)?;
        let line = serde_json::to_string(record)
            .map_err(|e| ExtractorError::Sink(format!("Failed to encode record: {}", e)))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| ExtractorError::Sink(format!("Writer lock error: {}", e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink; clones share the same records
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ExtractionRecord>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record appended so far, in append order
    pub fn records(&self) -> Vec<ExtractionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records appended
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    type Error = ExtractorError;

    fn append(&self, record: &ExtractionRecord) -> Result<(), Self::Error> {
        check_provenance(record)?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
