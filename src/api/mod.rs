/// HTTP surface over the poller

pub mod history_handler;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::ingest::TransactionPoller;

pub use history_handler::{history, parse_limit, ApiError, HistoryParams, DEFAULT_HISTORY_LIMIT};

pub fn router(poller: Arc<TransactionPoller>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/transactions/history", get(history))
        .with_state(poller)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, poller: Arc<TransactionPoller>, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!(%addr, "History API listening");

    axum::serve(listener, router(poller))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}

async fn health_check() -> &'static str {
    "OK"
}
