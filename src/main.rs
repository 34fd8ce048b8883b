use std::sync::Arc;

use anyhow::{Context, Result};
use helius_watch::api;
use helius_watch::config::Settings;
use helius_watch::ingest::{HeliusClient, TransactionPoller};
use helius_watch::transport::TransactionBus;
use helius_watch::ProcessedTransaction;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct ServiceOrchestrator {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<Result<()>>)>,
}

impl ServiceOrchestrator {
    fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            tasks: Vec::new(),
        }
    }

    #[instrument(skip(self, settings))]
    async fn start_all_services(&mut self, settings: Settings) -> Result<()> {
        info!("🚀 Starting helius-watch services");

        if let Err(e) = settings.credentials() {
            warn!("{}; polls and history queries return nothing until this is fixed", e);
        }

        let bus = TransactionBus::new();
        let client = HeliusClient::new(&settings).context("Failed to create Helius HTTP client")?;
        let poller = Arc::new(TransactionPoller::new(Arc::new(client), settings.clone(), bus.clone()));

        // Transaction log sink, subscribed before the first tick
        let receiver = bus.subscribe();
        let sink_shutdown = self.shutdown_tx.subscribe();
        let sink_task = tokio::spawn(run_transaction_sink(receiver, sink_shutdown));
        self.tasks.push(("transaction log sink", sink_task));

        // Periodic ingestion
        let poll_shutdown = self.shutdown_tx.subscribe();
        let poll_poller = Arc::clone(&poller);
        let poll_task = tokio::spawn(async move {
            info!("🔄 Periodic ingestion starting");
            let result = poll_poller.run(poll_shutdown).await;
            match &result {
                Ok(()) => info!("🛑 Periodic ingestion shut down gracefully"),
                Err(e) => error!("Periodic ingestion error: {}", e),
            }
            result
        });
        self.tasks.push(("periodic ingestion", poll_task));

        // History API
        let mut api_shutdown = self.shutdown_tx.subscribe();
        let bind_addr = settings.bind_addr;
        let api_task = tokio::spawn(async move {
            info!("🌐 History API starting");
            let shutdown = async move {
                let _ = api_shutdown.recv().await;
                info!("🛑 History API shutting down gracefully");
            };
            let result = api::serve(bind_addr, poller, shutdown).await;
            if let Err(e) = &result {
                error!("History API error: {:#}", e);
            }
            result
        });
        self.tasks.push(("history API", api_task));

        info!("✅ All {} services started successfully", self.tasks.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn shutdown_all(&mut self) -> Result<()> {
        info!("🛑 Shutting down all services");

        let _ = self.shutdown_tx.send(());
        debug!("Shutdown signal sent to all services");

        for (name, task) in self.tasks.drain(..) {
            match task.await {
                Ok(Ok(())) => info!("✅ {} shut down cleanly", name),
                Ok(Err(e)) => warn!("⚠️  {} error during shutdown: {}", name, e),
                Err(e) => error!("❌ {} task failed: {}", name, e),
            }
        }

        info!("✅ All services shut down successfully");
        Ok(())
    }
}

/// Log every transaction the poller publishes until shutdown.
async fn run_transaction_sink(
    mut receiver: broadcast::Receiver<ProcessedTransaction>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(transaction) => match serde_json::to_string(&transaction) {
                    Ok(json) => info!(signature = %transaction.signature, "📥 {}", json),
                    Err(e) => warn!("Failed to serialize processed transaction: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Transaction log sink lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
            _ = shutdown.recv() => {
                info!("🛑 Transaction log sink shutting down");
                return Ok(());
            }
        }
    }
}

fn init_tracing(settings: &Settings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.log_dir)
        .with_context(|| format!("Failed to create log directory {}", settings.log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&settings.log_dir, "helius-watch.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env().context("Invalid configuration")?;
    let _guard = init_tracing(&settings)?;

    info!("🛰️  helius-watch - Wallet Transaction Watcher");
    debug!(?settings, "Loaded settings");

    let mut orchestrator = ServiceOrchestrator::new();

    if let Err(e) = orchestrator.start_all_services(settings).await {
        error!("Failed to start services: {:#}", e);
        return Err(e);
    }
    info!("Press Ctrl+C to shutdown all services");

    match signal::ctrl_c().await {
        Ok(()) => info!("🛑 Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    orchestrator.shutdown_all().await?;

    info!("👋 helius-watch shutdown complete");
    Ok(())
}
