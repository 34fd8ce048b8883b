/// Transaction poller: periodic ingestion and on-demand history
///
/// The poller owns the ingestion cursor, the signature of the last record the
/// periodic job normalized. The cursor lives only as long as the process and
/// starts out empty. Only [`TransactionPoller::run_scheduled_poll`] moves it;
/// [`TransactionPoller::get_history`] never reads or writes it.
///
/// A poll holds the tick guard from cursor read to final cursor write, so ticks
/// are serialized. A tick that finds the guard taken is skipped rather than
/// queued. Reading the cursor never touches the guard.

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use helius_watch_core::{normalize, validate, ProcessedTransaction, RawTransaction};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn, Level};

use crate::config::{Credentials, Settings};
use crate::ingest::fetcher::{FetchError, FetchOutcome, TransactionSource};
use crate::transport::TransactionBus;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Empty,
    Set(String),
}

impl Cursor {
    pub fn before(&self) -> Option<&str> {
        match self {
            Cursor::Empty => None,
            Cursor::Set(signature) => Some(signature),
        }
    }

    fn advance(&mut self, signature: String) {
        *self = Cursor::Set(signature);
    }
}

/// What a single periodic tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Previous tick still running.
    Overlapping,
    NotConfigured,
    FetchFailed,
    Idle,
    Processed { processed: usize, skipped: usize },
}

pub struct TransactionPoller {
    source: Arc<dyn TransactionSource>,
    settings: Settings,
    cursor: RwLock<Cursor>,
    tick_guard: Mutex<()>,
    bus: TransactionBus,
}

impl TransactionPoller {
    pub fn new(source: Arc<dyn TransactionSource>, settings: Settings, bus: TransactionBus) -> Self {
        info!(
            poll_interval_secs = settings.poll_interval.as_secs(),
            poll_limit = settings.poll_limit.get(),
            "Initializing TransactionPoller"
        );
        Self {
            source,
            settings,
            cursor: RwLock::new(Cursor::Empty),
            tick_guard: Mutex::new(()),
            bus,
        }
    }

    pub async fn cursor(&self) -> Cursor {
        self.cursor.read().await.clone()
    }

    pub fn bus(&self) -> &TransactionBus {
        &self.bus
    }

    /// Fetch the next page before the cursor, process it oldest first and
    /// advance the cursor past every record that normalizes.
    #[instrument(skip(self))]
    pub async fn run_scheduled_poll(&self) -> PollOutcome {
        let Ok(_tick) = self.tick_guard.try_lock() else {
            warn!("Previous poll still running, skipping tick");
            return PollOutcome::Overlapping;
        };

        let Some(credentials) = self.credentials() else {
            return PollOutcome::NotConfigured;
        };

        let before = self.cursor.read().await.before().map(str::to_owned);
        debug!(?before, "Polling for new transactions");

        let outcome = self
            .source
            .fetch(&credentials, self.settings.poll_limit, before.as_deref())
            .await;

        let mut batch = match outcome {
            Ok(FetchOutcome::Batch(batch)) => batch,
            Ok(FetchOutcome::Empty) => {
                debug!("No new transactions found");
                return PollOutcome::Idle;
            }
            Err(e) => {
                log_fetch_error("Error fetching transactions from Helius", &e);
                return PollOutcome::FetchFailed;
            }
        };

        // Upstream is newest first
        batch.reverse();

        let mut processed = 0;
        let mut skipped = 0;
        for raw in &batch {
            match process_logged(raw) {
                Some(transaction) => {
                    self.cursor.write().await.advance(transaction.signature.clone());
                    info!(
                        signature = %transaction.signature,
                        slot = transaction.slot,
                        status = ?transaction.status,
                        "Processed transaction"
                    );
                    self.bus.publish(transaction);
                    processed += 1;
                }
                None => skipped += 1,
            }
        }

        debug!(processed, skipped, "Poll complete");
        PollOutcome::Processed { processed, skipped }
    }

    /// One page of normalized history in upstream order. Any configuration
    /// or upstream failure yields an empty page.
    #[instrument(skip(self))]
    pub async fn get_history(&self, limit: NonZeroU32, before: Option<&str>) -> Vec<ProcessedTransaction> {
        let Some(credentials) = self.credentials() else {
            return Vec::new();
        };

        let records = match self.source.fetch(&credentials, limit, before).await {
            Ok(outcome) => outcome.into_records(),
            Err(e) => {
                log_fetch_error("Error fetching historical transactions from Helius", &e);
                return Vec::new();
            }
        };

        records.iter().filter_map(process_logged).collect()
    }

    /// Drive [`Self::run_scheduled_poll`] on the configured interval until
    /// `shutdown` fires. Each tick runs as its own task; overlap is resolved by
    /// the tick guard. Ticks still in flight at shutdown are awaited.
    #[instrument(skip(self, shutdown))]
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("TransactionPoller: Starting periodic ingestion");

        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    while ticks.try_join_next().is_some() {}
                    let poller = Arc::clone(&self);
                    ticks.spawn(async move { poller.run_scheduled_poll().await });
                }
                _ = shutdown.recv() => {
                    debug!(in_flight = ticks.len(), "Waiting for in-flight ticks");
                    while let Some(result) = ticks.join_next().await {
                        if let Err(e) = result {
                            error!("Poll tick task failed: {}", e);
                        }
                    }
                    info!("TransactionPoller: Periodic ingestion stopped");
                    return Ok(());
                }
            }
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match self.settings.credentials() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }
}

fn process_logged(raw: &RawTransaction) -> Option<ProcessedTransaction> {
    match validate(raw) {
        Ok(valid) => Some(normalize(&valid)),
        Err(reason) => {
            warn!(signature = %raw.signature, "Transaction {} is {}. Skipping.", raw.signature, reason);
            if let Some(payload) = debug_payload(raw) {
                debug!("Raw Transaction Data: {}", payload);
            }
            None
        }
    }
}

/// Pretty-printed record, only built when debug logging is on.
fn debug_payload(raw: &RawTransaction) -> Option<String> {
    if !tracing::enabled!(Level::DEBUG) {
        return None;
    }
    match serde_json::to_string_pretty(raw) {
        Ok(payload) => Some(payload),
        Err(e) => Some(format!("<unserializable: {e}>")),
    }
}

fn log_fetch_error(context: &str, err: &FetchError) {
    error!("{}: {}", context, err);
    if let (Some(status), Some(body)) = (err.status(), err.body()) {
        error!(status, "Status: {}", status);
        error!("Data: {}", body);
    }
}
