use std::{
    env, fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_SHIFT_LABEL: &str = "Shift (8 hours)";

/// How the Sheets API interprets appended cell values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ValueInputOption {
    /// Stored exactly as sent.
    #[default]
    Raw,
    /// Parsed as if typed into the UI (numbers, dates, formulas).
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::UserEntered => "USER_ENTERED",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RAW" => Some(Self::Raw),
            "USER_ENTERED" => Some(Self::UserEntered),
            _ => None,
        }
    }
}

/// Typed configuration, read from `.env` and the process environment.
#[derive(Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Google Sheets
    pub google_sheet_credentials: String,
    pub google_sheet_key: String,
    pub google_sheet_range: String,
    pub value_input_option: ValueInputOption,

    // Flushing
    pub flush_interval: Duration,
    pub max_concurrent_flushes: usize,
    pub max_queue_size: usize,
    pub shift_label: String,
    pub skip_empty_reports: bool,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_allowed_users", &self.telegram_allowed_users)
            .field("google_sheet_credentials", &"<redacted>")
            .field("google_sheet_key", &self.google_sheet_key)
            .field("google_sheet_range", &self.google_sheet_range)
            .field("value_input_option", &self.value_input_option)
            .field("flush_interval", &self.flush_interval)
            .field("max_concurrent_flushes", &self.max_concurrent_flushes)
            .field("max_queue_size", &self.max_queue_size)
            .field("shift_label", &self.shift_label)
            .field("skip_empty_reports", &self.skip_empty_reports)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .finish()
    }
}

/// Load `.env` from the working directory (or a parent), if present.
///
/// Variables already set in the environment take precedence. Safe to call more
/// than once; call it before `logging::init` so `RUST_LOG` from `.env` applies.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    classify_dotenv(dotenvy::dotenv())
}

/// Like [`load_dotenv`], for an explicit file.
pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>> {
    classify_dotenv(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn classify_dotenv(res: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>> {
    match res {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(Error::Config(format!("failed to read .env: {e}"))),
    }
}

impl Config {
    /// Load `.env` (if present) and build the config from the environment.
    pub fn load() -> Result<Self> {
        match load_dotenv()? {
            Some(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            None => tracing::debug!("no .env file found"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).and_then(non_empty).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };

        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let google_sheet_credentials = required("GOOGLE_SHEET_CREDENTIALS")?;
        let google_sheet_key = required("GOOGLE_SHEET_KEY")?;

        let telegram_allowed_users = parse_csv_i64(lookup("TELEGRAM_ALLOWED_USERS"));

        let google_sheet_range = lookup("GOOGLE_SHEET_RANGE")
            .and_then(non_empty)
            .unwrap_or_else(|| "A1".to_string());

        let value_input_option = match lookup("GOOGLE_SHEET_VALUE_INPUT").and_then(non_empty) {
            None => ValueInputOption::default(),
            Some(raw) => ValueInputOption::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "GOOGLE_SHEET_VALUE_INPUT must be RAW or USER_ENTERED, got {raw:?}"
                ))
            })?,
        };

        let flush_interval =
            Duration::from_secs(parse_u64(lookup("FLUSH_INTERVAL_SECS")).unwrap_or(30).max(1));
        let max_concurrent_flushes = parse_usize(lookup("MAX_CONCURRENT_FLUSHES"))
            .unwrap_or(3)
            .max(1);
        let max_queue_size = parse_usize(lookup("MAX_QUEUE_SIZE")).unwrap_or(1000);
        let shift_label = lookup("SHIFT_LABEL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_SHIFT_LABEL.to_string());
        let skip_empty_reports = parse_bool(lookup("SKIP_EMPTY_REPORTS")).unwrap_or(false);

        let rate_limit_enabled = parse_bool(lookup("RATE_LIMIT_ENABLED")).unwrap_or(true);
        let rate_limit_requests = parse_u32(lookup("RATE_LIMIT_REQUESTS")).unwrap_or(60);
        let rate_limit_window =
            Duration::from_secs(parse_u64(lookup("RATE_LIMIT_WINDOW")).unwrap_or(60));

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            google_sheet_credentials,
            google_sheet_key,
            google_sheet_range,
            value_input_option,
            flush_interval,
            max_concurrent_flushes,
            max_queue_size,
            shift_label,
            skip_empty_reports,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_window,
        })
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_u32(v: Option<String>) -> Option<u32> {
    v.and_then(|s| s.trim().parse::<u32>().ok())
}

fn parse_usize(v: Option<String>) -> Option<usize> {
    v.and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
