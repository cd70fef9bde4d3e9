//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use docmint_extractor::Workflow;
use std::path::PathBuf;

/// Docmint - Turn tool documentation into training data.
#[derive(Debug, Parser)]
#[command(name = "docmint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ~/.docmint/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "docmint_extractor=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// API key for the model service
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the model service
    #[arg(long, global = true, env = "OPENAI_API_URL")]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a dataset from a documentation corpus
    Generate(GenerateArgs),

    /// Rewrite question/answer and prompt/code tables into dataset records
    Reformat(ReformatArgs),

    /// Ingest and chunk a corpus without calling the model
    Chunk(ChunkArgs),
}

/// Documentation workflows selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkflowArg {
    /// Question/answer pairs
    Qa,
    /// Script usage descriptions, gated by a script judge
    Script,
}

impl From<WorkflowArg> for Workflow {
    fn from(arg: WorkflowArg) -> Self {
        match arg {
            WorkflowArg::Qa => Workflow::Qa,
            WorkflowArg::Script => Workflow::Script,
        }
    }
}

/// Arguments for the generate command.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Dataset to generate
    #[arg(short, long, value_enum, default_value = "qa")]
    pub workflow: WorkflowArg,

    /// Root directory of the documentation corpus
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving the JSONL output
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seed for a reproducible segment order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Segments processed at the same time
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Arguments for the reformat command.
#[derive(Debug, Parser)]
pub struct ReformatArgs {
    /// Root directory holding the tables
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving the JSONL output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the chunk command.
#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// Root directory of the documentation corpus
    #[arg(short, long)]
    pub input: PathBuf,
}
