//! Generate command implementation.

use super::{build_client, cancel_on_interrupt};
use crate::cli::GenerateArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docmint_extractor::{Ingestor, JsonlSink, Pipeline, Workflow};
use docmint_llm::Cancellation;
use tracing::info;

/// Execute the generate command.
pub async fn execute_generate(
    args: GenerateArgs,
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
    if args.seed.is_some() {
        config.extractor.shuffle_seed = args.seed;
    }
    if let Some(workers) = args.workers {
        config.extractor.workers = workers;
    }

    let workflow = Workflow::from(args.workflow);
    let cancellation = Cancellation::new();
    let client = build_client(&config, cancellation.clone())?;
    let sink = JsonlSink::for_workflow(&config.extractor.output_dir, workflow)?;
    info!("Writing {} records to {}", workflow, sink.path().display());

    let pipeline = Pipeline::new(workflow, client, sink, config.extractor.clone())?;
    let ingestor = Ingestor::new(&args.input, config.extractor.known_projects.clone());

    let interrupt = cancel_on_interrupt(cancellation);
    let report = pipeline.run_corpus(&ingestor).await;
    interrupt.abort();

    println!("{}", formatter.run_report(&report, pipeline.sink().path()));
    Ok(())
}
