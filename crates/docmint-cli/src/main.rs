//! Docmint CLI - Turn tool documentation into training data.

use clap::Parser;
use docmint_cli::commands;
use docmint_cli::{AppConfig, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> docmint_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    // Load config, then let the environment and flags override it
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    let formatter = Formatter::new(!cli.no_color);

    match cli.command {
        Command::Generate(args) => commands::execute_generate(args, config, &formatter).await?,
        Command::Reformat(args) => commands::execute_reformat(args, config, &formatter).await?,
        Command::Chunk(args) => commands::execute_chunk(args, &config, &formatter)?,
    }

    Ok(())
}

/// `--log-level` wins over `RUST_LOG`; the default is `info`.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
