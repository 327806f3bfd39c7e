use chrono::{DateTime, Local};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// A text message waiting for the next flush.
#[derive(Clone, Debug)]
pub struct QueuedMessage {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub text: String,
    pub received_at: DateTime<Local>,
}

impl QueuedMessage {
    pub fn new(chat_id: ChatId, user_id: Option<UserId>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            text: text.into(),
            received_at: Local::now(),
        }
    }
}
