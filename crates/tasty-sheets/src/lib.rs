//! Google Sheets adapter (google-sheets4).
//!
//! Implements the `tasty-core` `SheetsPort` with `spreadsheets.values.append`.

use std::fmt;

use async_trait::async_trait;
use google_sheets4::{api::ValueRange, Sheets};

use tasty_core::{
    config::{Config, ValueInputOption},
    sheets::{SheetRow, SheetsPort},
    Error, Result,
};

pub mod auth;

use auth::{CredentialSource, Connector};

pub struct GoogleSheetsClient {
    hub: Sheets<Connector>,
    spreadsheet_key: String,
    range: String,
    value_input: ValueInputOption,
}

impl fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("spreadsheet_key", &self.spreadsheet_key)
            .field("range", &self.range)
            .field("value_input", &self.value_input)
            .finish()
    }
}

impl GoogleSheetsClient {
    /// Authenticate with the configured service account.
    pub async fn connect(cfg: &Config) -> Result<Self> {
        let client = auth::http_client();
        let source = CredentialSource::from_env_value(&cfg.google_sheet_credentials);
        let authenticator = auth::authenticator(&source, client.clone()).await?;

        tracing::info!(
            spreadsheet_key = %cfg.google_sheet_key,
            range = %cfg.google_sheet_range,
            "google sheets client ready"
        );

        Ok(Self {
            hub: Sheets::new(client, authenticator),
            spreadsheet_key: cfg.google_sheet_key.clone(),
            range: cfg.google_sheet_range.clone(),
            value_input: cfg.value_input_option,
        })
    }
}

fn value_range(row: &SheetRow) -> ValueRange {
    ValueRange {
        major_dimension: Some("ROWS".to_string()),
        range: None,
        values: Some(vec![row.to_json_values()]),
    }
}

#[async_trait]
impl SheetsPort for GoogleSheetsClient {
    async fn append_row(&self, row: &SheetRow) -> Result<()> {
        self.hub
            .spreadsheets()
            .values_append(value_range(row), &self.spreadsheet_key, &self.range)
            .value_input_option(self.value_input.as_str())
            .doit()
            .await
            .map(|_| ())
            .map_err(|e| {
                Error::External(format!(
                    "failed to append row to spreadsheet {}: {e}",
                    self.spreadsheet_key
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn value_range_wraps_row_as_single_row() {
        let row = SheetRow::new(vec![Some("Ann".to_string()), None]);
        let vr = value_range(&row);

        assert_eq!(vr.major_dimension.as_deref(), Some("ROWS"));
        assert_eq!(
            vr.values,
            Some(vec![vec![Value::String("Ann".to_string()), Value::Null]])
        );
    }
}
