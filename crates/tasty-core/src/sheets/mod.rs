//! Spreadsheet abstractions (Google Sheets today).

pub mod port;
pub mod types;

pub use port::SheetsPort;
pub use types::SheetRow;
