use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tasty_core::{
    config::Config,
    flusher::{FlushSettings, Flusher},
    queue::MessageQueue,
    sheets::{SheetRow, SheetsPort},
    Result,
};

use crate::router::AppState;

#[derive(Default)]
pub(crate) struct RecordingSheets {
    rows: Mutex<Vec<SheetRow>>,
}

impl RecordingSheets {
    pub(crate) fn rows(&self) -> Vec<SheetRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetsPort for RecordingSheets {
    async fn append_row(&self, row: &SheetRow) -> Result<()> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

/// App state over an in-memory sheet; `overrides` are extra config vars.
pub(crate) fn state_with(overrides: &[(&str, &str)]) -> (AppState, Arc<RecordingSheets>) {
    let mut vars: Vec<(String, String)> = vec![
        ("TELEGRAM_BOT_TOKEN".to_string(), "123:abc".to_string()),
        ("GOOGLE_SHEET_CREDENTIALS".to_string(), "creds.json".to_string()),
        ("GOOGLE_SHEET_KEY".to_string(), "sheet-key".to_string()),
    ];
    vars.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let cfg = Config::from_lookup(|key: &str| {
        vars.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap();
    let cfg = Arc::new(cfg);

    let sheets = Arc::new(RecordingSheets::default());
    let queue = Arc::new(MessageQueue::new(cfg.max_queue_size));
    let flusher = Flusher::new(
        queue.clone(),
        sheets.clone(),
        FlushSettings::from_config(&cfg),
    );

    (AppState::new(cfg, queue, flusher), sheets)
}
