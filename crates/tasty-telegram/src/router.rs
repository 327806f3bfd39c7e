use std::sync::Arc;

use anyhow::Context;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::Mutex;

use tasty_core::{config::Config, flusher::Flusher, queue::MessageQueue, security::RateLimiter};

use crate::handlers;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub queue: Arc<MessageQueue>,
    pub flusher: Flusher,
    pub rate_limiter: Mutex<RateLimiter>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, queue: Arc<MessageQueue>, flusher: Flusher) -> Self {
        let rate_limiter = RateLimiter::new(
            cfg.rate_limit_enabled,
            cfg.rate_limit_requests,
            cfg.rate_limit_window,
        );
        Self {
            cfg,
            queue,
            flusher,
            rate_limiter: Mutex::new(rate_limiter),
        }
    }
}

/// Long-poll Telegram until Ctrl-C.
pub async fn run_polling(
    cfg: Arc<Config>,
    queue: Arc<MessageQueue>,
    flusher: Flusher,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let username = require_identity(bot.get_me().await.map(|me| me.username().to_string()))?;
    tracing::info!(username = %username, "bot started");
    if cfg.telegram_allowed_users.is_empty() {
        tracing::info!("no TELEGRAM_ALLOWED_USERS set, accepting messages from everyone");
    } else {
        tracing::info!(count = cfg.telegram_allowed_users.len(), "allowed users");
    }

    let state = Arc::new(AppState::new(cfg, queue, flusher));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("dispatcher stopped");
    Ok(())
}

/// A token Telegram will not accept must stop startup; polling would otherwise
/// retry forever.
fn require_identity(
    me: std::result::Result<String, teloxide::RequestError>,
) -> anyhow::Result<String> {
    me.context("failed to verify TELEGRAM_BOT_TOKEN with Telegram")
}
