//! Telegram adapter (teloxide).
//!
//! Receives shift summaries over long polling, queues them for the flusher and
//! answers the small command set.

use teloxide::prelude::*;
use tokio::time::sleep;

use tasty_core::{domain::ChatId, errors::Error, Result};

pub mod handlers;
pub mod router;

fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat_id.0)
}

fn map_err(e: teloxide::RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

/// Send a plain-text reply, retrying once when Telegram asks us to back off.
pub async fn reply(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match bot.send_message(tg_chat(chat_id), text.to_string()).await {
            Ok(_) => return Ok(()),
            Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                attempts += 1;
                sleep(d).await;
            }
            Err(other) => return Err(map_err(other)),
        }
    }
}

/// Like [`reply`], but failures are only logged.
pub async fn reply_best_effort(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = reply(bot, chat_id, text).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }
}
