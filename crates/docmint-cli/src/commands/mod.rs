//! Command implementations.

pub mod chunk;
pub mod generate;
pub mod reformat;

pub use self::chunk::execute_chunk;
pub use self::generate::execute_generate;
pub use self::reformat::execute_reformat;

use crate::config::AppConfig;
use crate::error::Result;
use docmint_llm::{Cancellation, ExtractionClient, OpenAiProvider};
use tokio::task::JoinHandle;
use tracing::warn;

/// Build the model client from validated settings.
pub(crate) fn build_client(
    config: &AppConfig,
    cancellation: Cancellation,
) -> Result<ExtractionClient<OpenAiProvider>> {
    config.validate_provider()?;
    let provider = OpenAiProvider::new(config.provider.clone())?;
    Ok(ExtractionClient::new(provider, config.retry.clone()).with_cancellation(cancellation))
}

/// Cancel the run on the first Ctrl-C.
///
/// In-flight requests are interrupted and no new segment is started; the
/// records already written stay on disk.
pub(crate) fn cancel_on_interrupt(cancellation: Cancellation) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after in-flight segments");
            cancellation.cancel();
        }
    })
}
