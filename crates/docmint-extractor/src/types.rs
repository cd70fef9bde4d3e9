//! Workflow, per-segment state and run reporting types

use crate::error::ExtractorError;
use crate::prompt::STRUCTURED_RESPONSE_SUFFIX;
use docmint_domain::{Segment, TaskType};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A dataset-producing workflow
///
/// Each workflow names the task that produces its records, an optional gate
/// task that must approve a segment first, and the file it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workflow {
    /// Q&A pairs from documentation segments
    Qa,
    /// Script descriptions, gated by the script judge
    Script,
    /// Knowledge-advice rewrites of tabular question/answer rows
    KnowledgeAdvice,
    /// Code descriptions from tabular prompt/code rows
    Code,
}

impl Workflow {
    /// All workflows
    pub const ALL: [Workflow; 4] = [
        Workflow::Qa,
        Workflow::Script,
        Workflow::KnowledgeAdvice,
        Workflow::Code,
    ];

    /// Task whose records this workflow persists
    pub fn task(&self) -> TaskType {
        match self {
            Workflow::Qa => TaskType::Qa,
            Workflow::Script => TaskType::Script,
            Workflow::KnowledgeAdvice => TaskType::KnowledgeAdvice,
            Workflow::Code => TaskType::Code,
        }
    }

    /// Task that must approve a segment before extraction, if any
    pub fn gate(&self) -> Option<TaskType> {
        match self {
            Workflow::Script => Some(TaskType::ScriptJudge),
            _ => None,
        }
    }

    /// Output file name inside the output directory
    pub fn output_file(&self) -> &'static str {
        match self {
            Workflow::Qa => "qa_dataset.jsonl",
            Workflow::Script => "script_dataset.jsonl",
            Workflow::KnowledgeAdvice => "knowledge_advice.jsonl",
            Workflow::Code => "script_format.jsonl",
        }
    }

    /// Name used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Workflow::Qa => "qa",
            Workflow::Script => "script",
            Workflow::KnowledgeAdvice => "knowledge_advice",
            Workflow::Code => "code",
        }
    }

    /// Parse a workflow name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == s)
    }

    /// User message sent with a segment
    ///
    /// Reformatting workflows ask for a fenced answer explicitly.
    pub fn user_prompt(&self, segment: &Segment) -> String {
        match self {
            Workflow::Qa | Workflow::Script => segment.text.clone(),
            Workflow::KnowledgeAdvice | Workflow::Code => {
                format!("{}{}", segment.text, STRUCTURED_RESPONSE_SUFFIX)
            }
        }
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Workflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "unknown workflow '{}' (expected one of: qa, script, knowledge_advice, code)",
                s
            )
        })
    }
}

/// Where a segment is in its processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    /// Not attempted yet
    Pending,
    /// The gate task answered
    Judged {
        /// Whether extractable content was found
        found: bool,
    },
    /// A response validated
    Parsed,
    /// The last attempt failed validation; another will be made
    Retry,
    /// Validation failed on every allowed attempt
    Failed,
    /// Nothing to extract; no further requests
    Skipped,
}

impl SegmentStatus {
    /// Whether no further transitions happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SegmentStatus::Parsed | SegmentStatus::Failed | SegmentStatus::Skipped
        )
    }
}

/// Attempt bookkeeping for one stage of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    /// Attempts started
    pub attempts: u32,
    /// Attempts allowed
    pub max_attempts: u32,
    /// Current status
    pub status: SegmentStatus,
    /// Validation errors, one per failed attempt
    pub errors: Vec<String>,
}

impl AttemptState {
    /// Fresh state allowing `max_attempts` attempts
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            status: SegmentStatus::Pending,
            errors: Vec::new(),
        }
    }

    /// Start an attempt
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Record a failed attempt and return the resulting status
    pub fn record_failure(&mut self, error: &ExtractorError) -> SegmentStatus {
        self.errors.push(error.to_string());
        self.status = if self.attempts >= self.max_attempts {
            SegmentStatus::Failed
        } else {
            SegmentStatus::Retry
        };
        self.status
    }

    /// Record a validated response
    pub fn mark_parsed(&mut self) {
        self.status = SegmentStatus::Parsed;
    }

    /// Attempts that failed validation
    pub fn failed_attempts(&self) -> u32 {
        self.errors.len() as u32
    }
}

/// How a segment ended
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// A response validated and its records were written
    Parsed {
        /// Records appended to the sink
        records: usize,
        /// Attempts that failed validation before success
        failed_attempts: u32,
    },
    /// The gate found nothing to extract; no extraction request was sent
    JudgedOut {
        /// Attempts that failed validation before the verdict
        failed_attempts: u32,
    },
    /// Whitespace-only segment, never sent
    Blank,
    /// Validation failed on every allowed attempt
    Failed {
        /// Attempts made in the failing stage
        attempts: u32,
        /// Attempts that failed validation across every stage
        failed_attempts: u32,
        /// One message per failed attempt
        errors: Vec<String>,
        /// Whether a null-valued placeholder record was written
        placeholder_written: bool,
    },
    /// The model service stayed unreachable past the transport retry policy
    TransportFailed {
        /// Attempts that failed validation before the outage
        failed_attempts: u32,
        /// Last transport error
        error: String,
    },
    /// Records validated but could not be stored
    SinkFailed {
        /// Records appended before the failure
        written: usize,
        /// Store error
        error: String,
    },
    /// The run was cancelled while the segment was in flight
    Cancelled,
}

impl SegmentOutcome {
    /// Terminal status of the segment
    pub fn status(&self) -> SegmentStatus {
        match self {
            SegmentOutcome::Parsed { .. } => SegmentStatus::Parsed,
            SegmentOutcome::JudgedOut { .. } | SegmentOutcome::Blank => SegmentStatus::Skipped,
            SegmentOutcome::Failed { .. }
            | SegmentOutcome::TransportFailed { .. }
            | SegmentOutcome::SinkFailed { .. }
            | SegmentOutcome::Cancelled => SegmentStatus::Failed,
        }
    }

    /// Attempts that failed validation
    pub fn failed_attempts(&self) -> u32 {
        match self {
            SegmentOutcome::Parsed { failed_attempts, .. }
            | SegmentOutcome::JudgedOut { failed_attempts }
            | SegmentOutcome::Failed { failed_attempts, .. }
            | SegmentOutcome::TransportFailed { failed_attempts, .. } => *failed_attempts,
            SegmentOutcome::Blank | SegmentOutcome::SinkFailed { .. } | SegmentOutcome::Cancelled => 0,
        }
    }
}

/// Totals for one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Workflow that ran
    pub workflow: Workflow,
    /// Documents (or tabular files) loaded
    pub documents_loaded: usize,
    /// Files that could not be ingested
    pub files_skipped: usize,
    /// Segments queued for processing
    pub segments_total: usize,
    /// Segments whose records were written
    pub segments_parsed: usize,
    /// Segments that exhausted their validation attempts
    pub segments_failed: usize,
    /// Blank segments never sent
    pub segments_skipped: usize,
    /// Segments the gate judged to hold nothing extractable
    pub segments_judged_out: usize,
    /// Segments lost to transport failures
    pub transport_failures: usize,
    /// Attempts that failed validation, across all segments
    pub validation_failures: usize,
    /// Records appended
    pub records_written: usize,
    /// Placeholder records appended
    pub placeholders_written: usize,
    /// Segments whose records could not be stored
    pub sink_errors: usize,
    /// Segments interrupted by cancellation
    pub segments_cancelled: usize,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Whether the run stopped early under the abort policy
    pub aborted: bool,
    /// Wall-clock duration, set by [`RunReport::finish`]
    pub elapsed: Duration,
    started: Instant,
}

impl RunReport {
    /// Start a report for a run of `workflow`
    pub fn new(workflow: Workflow) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            workflow,
            documents_loaded: 0,
            files_skipped: 0,
            segments_total: 0,
            segments_parsed: 0,
            segments_failed: 0,
            segments_skipped: 0,
            segments_judged_out: 0,
            transport_failures: 0,
            validation_failures: 0,
            records_written: 0,
            placeholders_written: 0,
            sink_errors: 0,
            segments_cancelled: 0,
            cancelled: false,
            aborted: false,
            elapsed: Duration::ZERO,
            started: Instant::now(),
        }
    }

    /// Fold one segment outcome into the totals
    pub fn record(&mut self, outcome: &SegmentOutcome) {
        self.validation_failures += outcome.failed_attempts() as usize;

        match outcome {
            SegmentOutcome::Parsed { records, .. } => {
                self.segments_parsed += 1;
                self.records_written += records;
            }
            SegmentOutcome::JudgedOut { .. } => self.segments_judged_out += 1,
            SegmentOutcome::Blank => self.segments_skipped += 1,
            SegmentOutcome::Failed {
                placeholder_written,
                ..
            } => {
                self.segments_failed += 1;
                if *placeholder_written {
                    self.placeholders_written += 1;
                    self.records_written += 1;
                }
            }
            SegmentOutcome::TransportFailed { .. } => self.transport_failures += 1,
            SegmentOutcome::SinkFailed { written, .. } => {
                self.sink_errors += 1;
                self.records_written += written;
            }
            SegmentOutcome::Cancelled => self.segments_cancelled += 1,
        }
    }

    /// Segments that reached an outcome
    pub fn segments_processed(&self) -> usize {
        self.segments_parsed
            + self.segments_failed
            + self.segments_skipped
            + self.segments_judged_out
            + self.transport_failures
            + self.sink_errors
            + self.segments_cancelled
    }

    /// Segments never started (cancelled or aborted runs)
    pub fn segments_unprocessed(&self) -> usize {
        self.segments_total.saturating_sub(self.segments_processed())
    }

    /// Stop the clock
    pub fn finish(&mut self) {
        self.elapsed = self.started.elapsed();
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Run {} ({})", self.run_id, self.workflow),
            "======================".to_string(),
            format!("Documents loaded: {}", self.documents_loaded),
            format!("Files skipped: {}", self.files_skipped),
            format!("Segments: {}", self.segments_total),
            format!("  Parsed: {}", self.segments_parsed),
            format!("  Failed validation: {}", self.segments_failed),
            format!("  Judged out: {}", self.segments_judged_out),
            format!("  Blank: {}", self.segments_skipped),
            format!("  Transport failures: {}", self.transport_failures),
        ];

        if self.sink_errors > 0 {
            lines.push(format!("  Sink errors: {}", self.sink_errors));
        }
        if self.segments_cancelled > 0 {
            lines.push(format!("  Cancelled in flight: {}", self.segments_cancelled));
        }
        if self.segments_unprocessed() > 0 {
            lines.push(format!("  Not started: {}", self.segments_unprocessed()));
        }

        lines.push(format!("Validation failures: {}", self.validation_failures));
        lines.push(format!(
            "Records written: {} ({} placeholders)",
            self.records_written, self.placeholders_written
        ));

        if self.cancelled {
            lines.push("Run was cancelled".to_string());
        }
        if self.aborted {
            lines.push("Run was aborted after a failed segment".to_string());
        }

        lines.push(format!("Elapsed: {:.1}s", self.elapsed.as_secs_f64()));
        lines.join("\n")
    }
}
