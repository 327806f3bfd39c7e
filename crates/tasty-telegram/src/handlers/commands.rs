use tasty_core::{
    domain::{ChatId, QueuedMessage, UserId},
    flusher::FlushStats,
};

use crate::router::AppState;

const HELP: &str = "Send a \"Summary of Tips and VIPs\" message and it will be added to the sheet.\n\n\
/start - greeting\n\
/help - this message\n\
/status - queue and sheet statistics\n\
/flush - write queued messages to the sheet now";

fn parse_command(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");
    first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

fn format_status(pending: usize, stats: &FlushStats) -> String {
    let last = stats
        .last_flush_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "Pending messages: {pending}\n\
Flush runs: {} (skipped: {})\n\
Rows appended: {}\n\
Failed appends: {}\n\
Last flush: {last}",
        stats.runs, stats.skipped_runs, stats.appended, stats.failed
    )
}

/// Reply text for a `/command` message.
pub(crate) async fn command_response(chat_id: ChatId, text: &str, state: &AppState) -> String {
    let cmd = parse_command(text);
    tracing::info!(chat_id = chat_id.0, command = %cmd, "Received command");

    match cmd.as_str() {
        "start" => "Hi! I am your bot.".to_string(),
        "help" => HELP.to_string(),
        "status" => {
            let pending = state.flusher.pending().await;
            format_status(pending, &state.flusher.stats().await)
        }
        "flush" => match state.flusher.flush_now().await {
            Ok(out) if out.processed == 0 => "Nothing to flush.".to_string(),
            Ok(out) => format!(
                "Flushed {} message(s): {} appended, {} failed, {} skipped.",
                out.processed, out.appended, out.failed, out.skipped
            ),
            Err(e) => {
                tracing::error!(error = %e, "manual flush failed");
                "Flush failed, check the logs.".to_string()
            }
        },
        _ => "Unknown command. Use /help.".to_string(),
    }
}
