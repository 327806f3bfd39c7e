use std::sync::Arc;

use anyhow::Context;

use tasty_core::{
    config::Config,
    flusher::{FlushSettings, Flusher},
    queue::MessageQueue,
    sheets::SheetsPort,
};
use tasty_sheets::GoogleSheetsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may carry RUST_LOG, so it has to be read before logging starts.
    tasty_core::config::load_dotenv()?;
    tasty_core::logging::init("tasty")?;

    let cfg = Arc::new(Config::load()?);
    tracing::debug!(config = ?cfg, "configuration loaded");

    let sheets: Arc<dyn SheetsPort> = Arc::new(
        GoogleSheetsClient::connect(&cfg)
            .await
            .context("failed to set up Google Sheets")?,
    );

    let queue = Arc::new(MessageQueue::new(cfg.max_queue_size));
    let flusher = Flusher::new(queue.clone(), sheets, FlushSettings::from_config(&cfg));
    flusher.start().await;

    tracing::info!("Starting the bot...");
    let polled = tasty_telegram::router::run_polling(cfg, queue, flusher.clone())
        .await
        .context("telegram bot failed");

    let out = flusher.shutdown().await;
    if out.processed > 0 {
        tracing::info!(processed = out.processed, "flushed remaining messages on shutdown");
    }

    polled
}
