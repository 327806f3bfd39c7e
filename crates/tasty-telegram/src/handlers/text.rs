use tasty_core::{
    domain::{ChatId, QueuedMessage, UserId},
    errors::Error,
    security::RateLimit,
};

use crate::router::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextOutcome {
    Queued { depth: usize },
    RateLimited { wait_secs: u64 },
    QueueFull,
    Failed,
}

impl TextOutcome {
    /// Queued messages get no reply.
    pub(crate) fn reply(self) -> Option<String> {
        match self {
            Self::Queued { .. } => None,
            Self::RateLimited { wait_secs } => Some(format!(
                "Too many messages. Please wait {wait_secs}s and try again."
            )),
            Self::QueueFull => {
                Some("The queue is full right now. Please try again later.".to_string())
            }
            Self::Failed => Some("Could not queue your message. Please try again.".to_string()),
        }
    }
}

/// Rate-limit, then queue a plain text message for the next flush.
pub(crate) async fn queue_text(
    state: &AppState,
    chat_id: ChatId,
    user_id: Option<UserId>,
    text: &str,
) -> TextOutcome {
    if let Some(uid) = user_id {
        let limit = state.rate_limiter.lock().await.check(uid);
        if let RateLimit::Limited { retry_after } = limit {
            let secs = retry_after.as_secs().max(1);
            tracing::warn!(chat_id = chat_id.0, user_id = uid.0, secs, "rate limited");
            return TextOutcome::RateLimited { wait_secs: secs };
        }
    }

    tracing::info!(
        chat_id = chat_id.0,
        user_id = ?user_id.map(|u| u.0),
        "Received message: {text}"
    );

    match state
        .queue
        .push(QueuedMessage::new(chat_id, user_id, text))
        .await
    {
        Ok(depth) => {
            tracing::debug!(depth, "message queued");
            TextOutcome::Queued { depth }
        }
        Err(Error::QueueFull { capacity }) => {
            tracing::warn!(capacity, "queue full, rejecting message");
            TextOutcome::QueueFull
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to queue message");
            TextOutcome::Failed
        }
    }
}
