//! The extraction pipeline
//!
//! Segments are shuffled, then each one runs through its workflow: an
//! optional gate stage, the extraction stage, and persistence. A stage is a
//! bounded loop of request, validate, retry. Every segment is its own fault
//! domain; its outcome is folded into the [`RunReport`] and the run moves on.

use crate::chunking::TextChunker;
use crate::config::{ExhaustedPolicy, ExtractorConfig};
use crate::error::ExtractorError;
use crate::ingest::Ingestor;
use crate::parser::{validate_response, Validated};
use crate::prompt::PromptRouter;
use crate::types::{AttemptState, RunReport, SegmentOutcome, SegmentStatus, Workflow};
use docmint_domain::{ChatProvider, ExtractionRecord, RecordSink, Segment, TaskType};
use docmint_llm::{Cancellation, ExtractionClient, LlmError};
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Why a stage ended without a validated response
enum StageFailure {
    Exhausted(AttemptState),
    Transport { state: AttemptState, error: LlmError },
    Cancelled,
    Template(ExtractorError),
}

/// Drives one workflow over a set of segments
pub struct Pipeline<P, S> {
    workflow: Workflow,
    client: ExtractionClient<P>,
    router: PromptRouter,
    sink: S,
    chunker: TextChunker,
    config: ExtractorConfig,
}

impl<P, S> Pipeline<P, S>
where
    P: ChatProvider,
    S: RecordSink,
{
    /// Create a pipeline with the built-in prompt templates
    ///
    /// # Errors
    ///
    /// `ExtractorError::Config` if the configuration does not validate.
    pub fn new(
        workflow: Workflow,
        client: ExtractionClient<P>,
        sink: S,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let router = PromptRouter::standard()?;
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap);

        Ok(Self {
            workflow,
            client,
            router,
            sink,
            chunker,
            config,
        })
    }

    /// Replace the prompt router
    ///
    /// # Errors
    ///
    /// `ExtractorError::Template` if the router lacks a template this workflow needs.
    pub fn with_router(mut self, router: PromptRouter) -> Result<Self, ExtractorError> {
        let needed = std::iter::once(self.workflow.task()).chain(self.workflow.gate());
        for task in needed {
            if !router.supports(task) {
                return Err(ExtractorError::Template(format!(
                    "no template registered for {}",
                    task
                )));
            }
        }
        self.router = router;
        Ok(self)
    }

    /// Workflow being run
    pub fn workflow(&self) -> Workflow {
        self.workflow
    }

    /// The record sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The chunker built from the configuration
    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// The cancellation signal shared with the client
    pub fn cancellation(&self) -> &Cancellation {
        self.client.cancellation()
    }

    /// Ingest a corpus, chunk it and process every segment
    pub async fn run_corpus(&self, ingestor: &Ingestor) -> RunReport {
        let mut report = RunReport::new(self.workflow);
        let mut segments = Vec::new();

        for result in ingestor.scan() {
            match result {
                Ok(document) => {
                    report.documents_loaded += 1;
                    segments.extend(self.chunker.chunk_document(&document));
                }
                Err(e) => {
                    warn!("Skipping file: {}", e);
                    report.files_skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} documents from {} ({} skipped), {} segments",
            report.documents_loaded,
            ingestor.root().display(),
            report.files_skipped,
            segments.len()
        );

        self.process(segments, report).await
    }

    /// Process prepared segments
    pub async fn run_segments(&self, segments: Vec<Segment>) -> RunReport {
        self.process(segments, RunReport::new(self.workflow)).await
    }

    async fn process(&self, mut segments: Vec<Segment>, mut report: RunReport) -> RunReport {
        let mut rng = match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        segments.shuffle(&mut rng);
        report.segments_total = segments.len();

        info!(
            "Starting {} run {}: {} segments, {} worker(s)",
            self.workflow,
            report.run_id,
            segments.len(),
            self.config.workers
        );

        let cancellation = self.client.cancellation();
        let stop = AtomicBool::new(false);

        let mut outcomes = stream::iter(segments)
            .take_while(|_| {
                futures::future::ready(!stop.load(Ordering::SeqCst) && !cancellation.is_cancelled())
            })
            .map(|segment| async move { self.process_segment(&segment).await })
            .buffer_unordered(self.config.workers);

        while let Some(outcome) = outcomes.next().await {
            if matches!(outcome, SegmentOutcome::Failed { .. })
                && self.config.on_exhausted == ExhaustedPolicy::Abort
            {
                error!("Aborting run {} after a failed segment", report.run_id);
                stop.store(true, Ordering::SeqCst);
                report.aborted = true;
            }
            report.record(&outcome);
        }

        report.cancelled = cancellation.is_cancelled();
        report.finish();
        info!(
            "Finished {} run {}: {} records from {} segments in {:.1}s",
            self.workflow,
            report.run_id,
            report.records_written,
            report.segments_processed(),
            report.elapsed.as_secs_f64()
        );
        info!("{}", report.summary());
        report
    }

    /// Run one segment through the workflow and persist its records
    pub async fn process_segment(&self, segment: &Segment) -> SegmentOutcome {
        if segment.is_blank() {
            debug!("Skipping blank segment at offset {}", segment.offset);
            return SegmentOutcome::Blank;
        }

        let mut failed_attempts = 0;

        if let Some(gate) = self.workflow.gate() {
            match self.run_stage(gate, segment).await {
                Ok((Validated::Judgement(false), state)) => {
                    debug!(
                        "{} found nothing in segment from '{}'",
                        gate, segment.source_label
                    );
                    return SegmentOutcome::JudgedOut {
                        failed_attempts: state.failed_attempts(),
                    };
                }
                Ok((_, state)) => failed_attempts += state.failed_attempts(),
                Err(failure) => return self.stage_failed(segment, failure, failed_attempts),
            }
        }

        let (validated, state) = match self.run_stage(self.workflow.task(), segment).await {
            Ok(result) => result,
            Err(failure) => return self.stage_failed(segment, failure, failed_attempts),
        };
        failed_attempts += state.failed_attempts();

        let mut written = 0;
        for fields in validated.into_records() {
            let record = ExtractionRecord::new(fields, segment);
            if let Err(e) = self.sink.append(&record) {
                error!("Failed to store record from '{}': {}", record.source, e);
                return SegmentOutcome::SinkFailed {
                    written,
                    error: e.to_string(),
                };
            }
            written += 1;
        }

        debug!("Wrote {} records from segment at offset {}", written, segment.offset);
        SegmentOutcome::Parsed {
            records: written,
            failed_attempts,
        }
    }

    /// Request, validate and retry until a response validates or attempts run out
    async fn run_stage(
        &self,
        task: TaskType,
        segment: &Segment,
    ) -> Result<(Validated, AttemptState), StageFailure> {
        let system_prompt = self
            .router
            .render(task, &segment.source_label)
            .map_err(StageFailure::Template)?;
        let user_prompt = self.workflow.user_prompt(segment);
        let mut state = AttemptState::new(self.config.max_validation_retries);

        loop {
            state.begin_attempt();

            let response = match self.client.complete(&system_prompt, &user_prompt).await {
                Ok(response) => response,
                Err(LlmError::Cancelled) => return Err(StageFailure::Cancelled),
                Err(error) => return Err(StageFailure::Transport { state, error }),
            };

            match validate_response(task, &response) {
                Ok(validated) => {
                    if let Validated::Judgement(found) = validated {
                        state.status = SegmentStatus::Judged { found };
                    } else {
                        state.mark_parsed();
                    }
                    return Ok((validated, state));
                }
                Err(e) => {
                    warn!(
                        "{} attempt {}/{} for segment from '{}' failed: {}",
                        task, state.attempts, state.max_attempts, segment.source_label, e
                    );
                    if state.record_failure(&e) == SegmentStatus::Failed {
                        return Err(StageFailure::Exhausted(state));
                    }
                }
            }
        }
    }

    fn stage_failed(
        &self,
        segment: &Segment,
        failure: StageFailure,
        prior_failed_attempts: u32,
    ) -> SegmentOutcome {
        match failure {
            StageFailure::Cancelled => {
                debug!("Segment at offset {} cancelled", segment.offset);
                SegmentOutcome::Cancelled
            }
            StageFailure::Transport { state, error } => {
                error!(
                    "Giving up on segment from '{}' after transport failure: {}",
                    segment.source_label, error
                );
                SegmentOutcome::TransportFailed {
                    failed_attempts: prior_failed_attempts + state.failed_attempts(),
                    error: error.to_string(),
                }
            }
            StageFailure::Template(e) => {
                error!("Cannot build prompt: {}", e);
                SegmentOutcome::Failed {
                    attempts: 0,
                    failed_attempts: prior_failed_attempts,
                    errors: vec![e.to_string()],
                    placeholder_written: false,
                }
            }
            StageFailure::Exhausted(state) => {
                error!(
                    "Segment from '{}' failed validation {} times, giving up",
                    segment.source_label, state.attempts
                );
                let placeholder_written = self.config.on_exhausted == ExhaustedPolicy::Placeholder
                    && self.write_placeholder(segment);

                SegmentOutcome::Failed {
                    attempts: state.attempts,
                    failed_attempts: prior_failed_attempts + state.failed_attempts(),
                    errors: state.errors,
                    placeholder_written,
                }
            }
        }
    }

    fn write_placeholder(&self, segment: &Segment) -> bool {
        let record = ExtractionRecord::placeholder(self.workflow.task(), segment);
        match self.sink.append(&record) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to store placeholder record: {}", e);
                false
            }
        }
    }
}
