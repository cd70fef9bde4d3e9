//! Tabular reformatting inputs
//!
//! Existing question/answer and prompt/code tables are turned into segments
//! so they can run through the same pipeline as documentation. The file
//! path decides the table kind:
//!
//! - `Question-Answer` tables have `Prompts` and `Answers` columns and feed
//!   the knowledge-advice workflow.
//! - `Prompt-Script` tables have `prompt` and `code` columns and feed the
//!   code workflow.

use crate::error::ExtractorError;
use crate::ingest::infer_source_label;
use crate::types::Workflow;
use docmint_domain::Segment;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Kind of table, recognised from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `Prompts` / `Answers` columns
    QuestionAnswer,
    /// `prompt` / `code` columns
    PromptScript,
}

impl TableKind {
    /// Recognise a table from its path
    pub fn from_path(path: &Path) -> Option<Self> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return None;
        }

        let path = path.to_string_lossy();
        if path.contains("Question-Answer") {
            Some(TableKind::QuestionAnswer)
        } else if path.contains("Prompt-Script") {
            Some(TableKind::PromptScript)
        } else {
            None
        }
    }

    /// Workflow fed by this kind of table
    pub fn workflow(&self) -> Workflow {
        match self {
            TableKind::QuestionAnswer => Workflow::KnowledgeAdvice,
            TableKind::PromptScript => Workflow::Code,
        }
    }

    /// User content for one row
    pub fn compose(&self, first: &str, second: &str) -> String {
        match self {
            TableKind::QuestionAnswer => format!("Question: {}\n Answer: {}", first, second),
            TableKind::PromptScript => format!("query: {}\n code: {}", first, second),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionAnswerRow {
    #[serde(rename = "Prompts")]
    prompt: String,
    #[serde(rename = "Answers")]
    answer: String,
}

#[derive(Debug, Deserialize)]
struct PromptScriptRow {
    prompt: String,
    code: String,
}

/// Read the usable rows of one table
///
/// Returns the composed row contents and the number of rows dropped for a
/// missing value.
pub fn read_table(path: &Path, kind: TableKind) -> Result<(Vec<String>, usize), ExtractorError> {
    let (rows, dropped) = match kind {
        TableKind::QuestionAnswer => {
            collect_rows(path, kind, |row: QuestionAnswerRow| (row.prompt, row.answer))?
        }
        TableKind::PromptScript => {
            collect_rows(path, kind, |row: PromptScriptRow| (row.prompt, row.code))?
        }
    };

    debug!(
        "Read {} rows from {} ({} dropped)",
        rows.len(),
        path.display(),
        dropped
    );
    Ok((rows, dropped))
}

fn collect_rows<R, F>(path: &Path, kind: TableKind, split: F) -> Result<(Vec<String>, usize), ExtractorError>
where
    R: DeserializeOwned,
    F: Fn(R) -> (String, String),
{
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| ExtractorError::ingestion(path, e.to_string()))?;

    let mut rows = Vec::new();
    let mut dropped = 0;
    for result in reader.deserialize::<R>() {
        let (first, second) = split(result.map_err(|e| ExtractorError::ingestion(path, e.to_string()))?);
        if first.trim().is_empty() || second.trim().is_empty() {
            dropped += 1;
        } else {
            rows.push(kind.compose(&first, &second));
        }
    }
    Ok((rows, dropped))
}

/// Segments built from every table under a root
#[derive(Debug, Clone, Default)]
pub struct TabularCorpus {
    /// Rows for the knowledge-advice workflow
    pub knowledge_advice: Vec<Segment>,
    /// Rows for the code workflow
    pub code: Vec<Segment>,
    /// Tables read
    pub files_read: usize,
    /// Tables that could not be read
    pub files_skipped: usize,
    /// Rows dropped for a missing value
    pub rows_dropped: usize,
}

impl TabularCorpus {
    /// Discover and read every recognised table under `root`
    pub fn load<S: AsRef<str>>(root: &Path, known_projects: &[S]) -> Self {
        let mut corpus = Self::default();

        for (path, kind) in discover_tables(root) {
            let label = infer_source_label(&path, known_projects);
            match read_table(&path, kind) {
                Ok((rows, dropped)) => {
                    corpus.files_read += 1;
                    corpus.rows_dropped += dropped;
                    let segments = rows.into_iter().map(|row| Segment::new(row, label.as_str()));
                    match kind.workflow() {
                        Workflow::KnowledgeAdvice => corpus.knowledge_advice.extend(segments),
                        _ => corpus.code.extend(segments),
                    }
                }
                Err(e) => {
                    warn!("Skipping table: {}", e);
                    corpus.files_skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} tables ({} skipped): {} knowledge-advice rows, {} code rows",
            corpus.files_read,
            corpus.files_skipped,
            corpus.knowledge_advice.len(),
            corpus.code.len()
        );
        corpus
    }

    /// Segments for a workflow (empty for documentation workflows)
    pub fn segments(&self, workflow: Workflow) -> &[Segment] {
        match workflow {
            Workflow::KnowledgeAdvice => &self.knowledge_advice,
            Workflow::Code => &self.code,
            Workflow::Qa | Workflow::Script => &[],
        }
    }
}

/// Recognised tables under `root`, sorted by path
pub fn discover_tables(root: &Path) -> Vec<(PathBuf, TableKind)> {
    let mut tables: Vec<_> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| TableKind::from_path(entry.path()).map(|kind| (entry.into_path(), kind)))
        .collect();
    tables.sort_by(|a, b| a.0.cmp(&b.0));
    tables
}
