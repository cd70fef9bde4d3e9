//! Reformat command implementation.

use super::{build_client, cancel_on_interrupt};
use crate::cli::ReformatArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docmint_extractor::{JsonlSink, Pipeline, TabularCorpus, Workflow};
use docmint_llm::Cancellation;
use tracing::info;

/// Execute the reformat command.
///
/// Question/answer tables run through the knowledge-advice workflow and
/// prompt/code tables through the code workflow, each into its own file.
pub async fn execute_reformat(
    args: ReformatArgs,
    mut config: AppConfig,
    formatter: &Formatter,
) -> Result<()> {
    if !args.input.is_dir() {
        return Err(CliError::Config(format!(
            "Input directory {} does not exist",
            args.input.display()
        )));
    }
    if let Some(output) = args.output {
        config.extractor.output_dir = output;
    }
    config.validate_provider()?;

    let corpus = TabularCorpus::load(&args.input, &config.extractor.known_projects);
    if corpus.files_read == 0 {
        println!("{}", formatter.warning("No Question-Answer or Prompt-Script tables found."));
        return Ok(());
    }
    if corpus.rows_dropped > 0 {
        println!(
            "{}",
            formatter.info(&format!("{} incomplete row(s) dropped", corpus.rows_dropped))
        );
    }

    let cancellation = Cancellation::new();
    let interrupt = cancel_on_interrupt(cancellation.clone());

    for workflow in [Workflow::KnowledgeAdvice, Workflow::Code] {
        let segments = corpus.segments(workflow);
        if segments.is_empty() {
            continue;
        }
        if cancellation.is_cancelled() {
            break;
        }

        let client = build_client(&config, cancellation.clone())?;
        let sink = JsonlSink::for_workflow(&config.extractor.output_dir, workflow)?;
        info!("Reformatting {} rows into {}", segments.len(), sink.path().display());

        let pipeline = Pipeline::new(workflow, client, sink, config.extractor.clone())?;
        let mut report = pipeline.run_segments(segments.to_vec()).await;
        report.documents_loaded = corpus.files_read;
        report.files_skipped = corpus.files_skipped;

        println!("{}", formatter.run_report(&report, pipeline.sink().path()));
    }

    interrupt.abort();
    Ok(())
}
