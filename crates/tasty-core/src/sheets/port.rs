use async_trait::async_trait;

use crate::{sheets::types::SheetRow, Result};

/// Spreadsheet port.
///
/// Appends go to the end of the configured worksheet; implementations must not
/// reorder rows from a single caller.
#[async_trait]
pub trait SheetsPort: Send + Sync {
    async fn append_row(&self, row: &SheetRow) -> Result<()>;
}
