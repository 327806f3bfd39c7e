/// Core error type for the bot.
///
/// Adapter crates (Telegram, Google Sheets) map their specific errors into this
/// type so the core can log and count failures consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("message queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
