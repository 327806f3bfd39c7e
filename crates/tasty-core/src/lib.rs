//! Core logic for the tasty shift-report bot.
//!
//! Telegram and Google Sheets live behind adapter crates; this crate holds the
//! configuration, report extraction, the pending message queue and the periodic
//! flusher that turns queued reports into spreadsheet rows.

pub mod config;
pub mod domain;
pub mod errors;
pub mod flusher;
pub mod logging;
pub mod queue;
pub mod report;
pub mod security;
pub mod sheets;

pub use errors::{Error, Result};
