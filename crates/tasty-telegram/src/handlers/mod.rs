//! Telegram update handlers.
//!
//! Every message is checked against the allow-list first. Commands are answered
//! directly; plain text is queued for the next flush.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tasty_core::domain::{ChatId, UserId};
use tasty_core::security::is_authorized;

use crate::reply_best_effort;
use crate::router::AppState;

mod commands;
mod text;

#[cfg(test)]
mod test_support;

const UNAUTHORIZED: &str = "Unauthorized. Contact the bot owner for access.";

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    let reply = match msg.text() {
        Some(text) => respond_to_text(&state, chat_id, user_id, text).await,
        None if !is_authorized(user_id, &state.cfg.telegram_allowed_users) => {
            Some(UNAUTHORIZED.to_string())
        }
        None => {
            tracing::debug!(chat_id = chat_id.0, "ignoring non-text message");
            None
        }
    };

    if let Some(reply) = reply {
        reply_best_effort(&bot, chat_id, &reply).await;
    }
    Ok(())
}

/// Decide what to do with a text message; returns the reply, if any.
async fn respond_to_text(
    state: &AppState,
    chat_id: ChatId,
    user_id: Option<UserId>,
    text: &str,
) -> Option<String> {
    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        tracing::warn!(chat_id = chat_id.0, user_id = ?user_id.map(|u| u.0), "unauthorized message");
        return Some(UNAUTHORIZED.to_string());
    }

    if text.starts_with('/') {
        return Some(commands::command_response(chat_id, text, state).await);
    }

    text::queue_text(state, chat_id, user_id, text).await.reply()
}
