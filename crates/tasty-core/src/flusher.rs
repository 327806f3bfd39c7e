//! Periodic flusher: drains the message queue and appends one sheet row per
//! queued report.
//!
//! - Fires immediately on start, then every `flush_interval`
//! - At most `max_concurrent_flushes` runs in flight; extra ticks are skipped
//! - Failed appends are logged and counted, never re-queued
//! - `shutdown()` waits for in-flight runs and drains what is left

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::{
    sync::{Mutex, OwnedSemaphorePermit, Semaphore},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config, errors::Error, queue::MessageQueue, report::ShiftReport, sheets::SheetsPort,
    Result,
};

#[derive(Clone, Debug)]
pub struct FlushSettings {
    pub interval: Duration,
    pub max_concurrent: usize,
    pub shift_label: String,
    pub skip_empty_reports: bool,
}

impl FlushSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: cfg.flush_interval,
            max_concurrent: cfg.max_concurrent_flushes.max(1),
            shift_label: cfg.shift_label.clone(),
            skip_empty_reports: cfg.skip_empty_reports,
        }
    }
}

/// Counters for a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub processed: usize,
    pub appended: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Totals since startup.
#[derive(Clone, Debug, Default)]
pub struct FlushStats {
    pub runs: u64,
    pub skipped_runs: u64,
    pub appended: u64,
    pub failed: u64,
    pub last_flush_at: Option<DateTime<Local>>,
}

#[derive(Clone)]
pub struct Flusher {
    inner: Arc<FlusherInner>,
}

struct FlusherInner {
    queue: Arc<MessageQueue>,
    sheets: Arc<dyn SheetsPort>,
    settings: FlushSettings,
    slots: Arc<Semaphore>,
    cancel: CancellationToken,
    stats: Mutex<FlushStats>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Flusher {
    pub fn new(
        queue: Arc<MessageQueue>,
        sheets: Arc<dyn SheetsPort>,
        settings: FlushSettings,
    ) -> Self {
        let slots = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
        Self {
            inner: Arc::new(FlusherInner {
                queue,
                sheets,
                settings,
                slots,
                cancel: CancellationToken::new(),
                stats: Mutex::new(FlushStats::default()),
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Start the ticker task. Calling it twice is a no-op.
    pub async fn start(&self) {
        let mut ticker = self.inner.ticker.lock().await;
        if ticker.is_some() {
            return;
        }

        tracing::info!(
            interval_secs = self.inner.settings.interval.as_secs(),
            max_concurrent = self.inner.settings.max_concurrent,
            "starting flusher"
        );

        let this = self.clone();
        *ticker = Some(tokio::spawn(async move { this.tick_loop().await }));
    }

    async fn tick_loop(&self) {
        // First tick completes immediately.
        let mut ticks = interval(self.inner.settings.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => break,
                _ = ticks.tick() => self.on_tick().await,
            }
        }
    }

    pub(crate) async fn on_tick(&self) {
        match self.inner.slots.clone().try_acquire_owned() {
            Ok(permit) => {
                let this = self.clone();
                tokio::spawn(async move { this.run_with_permit(permit).await });
            }
            Err(_) => {
                self.inner.stats.lock().await.skipped_runs += 1;
                tracing::warn!(
                    max_concurrent = self.inner.settings.max_concurrent,
                    "flush skipped: maximum number of running instances reached"
                );
            }
        }
    }

    async fn run_with_permit(&self, _permit: OwnedSemaphorePermit) -> FlushOutcome {
        self.run_once().await
    }

    /// Run a flush now, waiting for a free slot if all are busy.
    pub async fn flush_now(&self) -> Result<FlushOutcome> {
        let permit = self
            .inner
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::External("flusher is shut down".to_string()))?;
        Ok(self.run_with_permit(permit).await)
    }

    /// Drain the queue and append every report. Callers must hold a slot.
    async fn run_once(&self) -> FlushOutcome {
        let batch = self.inner.queue.drain().await;
        let mut outcome = FlushOutcome::default();

        if !batch.is_empty() {
            tracing::debug!(size = batch.len(), "processing batch");
        }

        for msg in batch {
            outcome.processed += 1;
            let report = ShiftReport::extract(&msg.text);
            let queued_secs = Local::now()
                .signed_duration_since(msg.received_at)
                .num_seconds()
                .max(0);
            tracing::info!(
                chat_id = msg.chat_id.0,
                queued_secs,
                "Extracted data: {report}"
            );

            if self.inner.settings.skip_empty_reports && report.is_empty() {
                tracing::warn!(chat_id = msg.chat_id.0, "no report fields found, skipping");
                outcome.skipped += 1;
                continue;
            }

            let row = report.to_row(&self.inner.settings.shift_label);
            match self.inner.sheets.append_row(&row).await {
                Ok(()) => {
                    outcome.appended += 1;
                    tracing::info!("Data appended to Google Sheet");
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(error = %e, "Error appending data to Google Sheet");
                }
            }
        }

        let mut stats = self.inner.stats.lock().await;
        stats.runs += 1;
        stats.appended += outcome.appended as u64;
        stats.failed += outcome.failed as u64;
        if outcome.processed > 0 {
            stats.last_flush_at = Some(Local::now());
        }

        outcome
    }

    pub async fn stats(&self) -> FlushStats {
        self.inner.stats.lock().await.clone()
    }

    pub async fn pending(&self) -> usize {
        self.inner.queue.len().await
    }

    /// Stop ticking, wait for in-flight runs, then flush whatever is still
    /// queued. Later `flush_now` calls fail.
    pub async fn shutdown(&self) -> FlushOutcome {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.ticker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "flusher ticker ended abnormally");
            }
        }

        let all = u32::try_from(self.inner.settings.max_concurrent.max(1)).unwrap_or(u32::MAX);
        let outcome = match self.inner.slots.acquire_many(all).await {
            Ok(_permits) => self.run_once().await,
            Err(_) => FlushOutcome::default(),
        };
        self.inner.slots.close();

        tracing::info!(
            appended = outcome.appended,
            failed = outcome.failed,
            "flusher stopped"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{ChatId, QueuedMessage, UserId},
        sheets::SheetRow,
    };

    #[derive(Default)]
    struct FakeSheets {
        rows: StdMutex<Vec<SheetRow>>,
        fail_when_name: Option<String>,
        started: AtomicUsize,
        gate: Option<Semaphore>,
    }

    impl FakeSheets {
        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::default()
            }
        }

        fn names(&self) -> Vec<Option<String>> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.cells()[0].clone())
                .collect()
        }
    }

    #[async_trait]
    impl SheetsPort for FakeSheets {
        async fn append_row(&self, row: &SheetRow) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail_when_name.is_some() && row.cells()[0] == self.fail_when_name {
                return Err(Error::External("sheet unavailable".to_string()));
            }
            self.rows.lock().unwrap().push(row.clone());
            Ok(())
        }
    }

    fn settings(max_concurrent: usize, skip_empty_reports: bool) -> FlushSettings {
        FlushSettings {
            interval: Duration::from_secs(3600),
            max_concurrent,
            shift_label: "Shift (8 hours)".to_string(),
            skip_empty_reports,
        }
    }

    async fn enqueue(queue: &MessageQueue, text: &str) {
        queue
            .push(QueuedMessage::new(ChatId(10), Some(UserId(20)), text))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn flush_appends_rows_in_arrival_order() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::default());
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(3, false));

        enqueue(&queue, "Summary of Tips and VIPs for Ann").await;
        enqueue(&queue, "Summary of Tips and VIPs for Bea").await;

        let out = flusher.flush_now().await.unwrap();
        assert_eq!(
            out,
            FlushOutcome {
                processed: 2,
                appended: 2,
                failed: 0,
                skipped: 0
            }
        );
        assert_eq!(
            sheets.names(),
            vec![Some("Ann".to_string()), Some("Bea".to_string())]
        );
        assert_eq!(flusher.pending().await, 0);

        let stats = flusher.stats().await;
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.appended, 2);
        assert!(stats.last_flush_at.is_some());
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::default());
        let flusher = Flusher::new(queue, sheets.clone(), settings(3, false));

        assert_eq!(flusher.flush_now().await.unwrap(), FlushOutcome::default());
        assert!(sheets.names().is_empty());
        assert!(flusher.stats().await.last_flush_at.is_none());
    }

    #[tokio::test]
    async fn failed_append_is_counted_and_batch_continues() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets {
            fail_when_name: Some("Bad".to_string()),
            ..FakeSheets::default()
        });
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(3, false));

        enqueue(&queue, "Summary of Tips and VIPs for Bad").await;
        enqueue(&queue, "Summary of Tips and VIPs for Good").await;

        let out = flusher.flush_now().await.unwrap();
        assert_eq!(out.appended, 1);
        assert_eq!(out.failed, 1);
        assert_eq!(sheets.names(), vec![Some("Good".to_string())]);
        // Failed rows are dropped, not re-queued.
        assert_eq!(flusher.pending().await, 0);
        assert_eq!(flusher.stats().await.failed, 1);
    }

    #[tokio::test]
    async fn empty_reports_are_appended_unless_skipping_is_enabled() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::default());
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(3, false));
        enqueue(&queue, "good morning").await;
        assert_eq!(flusher.flush_now().await.unwrap().appended, 1);
        assert_eq!(sheets.names(), vec![None]);

        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::default());
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(3, true));
        enqueue(&queue, "good morning").await;
        let out = flusher.flush_now().await.unwrap();
        assert_eq!(out.skipped, 1);
        assert_eq!(out.appended, 0);
        assert!(sheets.names().is_empty());
    }

    #[tokio::test]
    async fn ticks_beyond_max_concurrent_runs_are_skipped() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::gated());
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(2, false));

        for (i, name) in ["One", "Two"].into_iter().enumerate() {
            enqueue(&queue, &format!("Summary of Tips and VIPs for {name}")).await;
            flusher.on_tick().await;
            while sheets.started.load(Ordering::SeqCst) < i + 1 {
                tokio::task::yield_now().await;
            }
        }

        flusher.on_tick().await;
        assert_eq!(flusher.stats().await.skipped_runs, 1);

        if let Some(gate) = &sheets.gate {
            gate.add_permits(2);
        }
        flusher.shutdown().await;

        let mut names = sheets.names();
        names.sort();
        assert_eq!(
            names,
            vec![Some("One".to_string()), Some("Two".to_string())]
        );
    }

    #[tokio::test]
    async fn shutdown_drains_remaining_messages_and_closes() {
        let queue = Arc::new(MessageQueue::new(0));
        let sheets = Arc::new(FakeSheets::default());
        let flusher = Flusher::new(queue.clone(), sheets.clone(), settings(3, false));
        flusher.start().await;

        enqueue(&queue, "Summary of Tips and VIPs for Late").await;
        let out = flusher.shutdown().await;

        // The immediate first tick may already have taken the message.
        assert_eq!(sheets.names(), vec![Some("Late".to_string())]);
        assert!(out.appended <= 1);
        assert!(flusher.flush_now().await.is_err());
    }
}
