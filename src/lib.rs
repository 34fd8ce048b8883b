// Configuration
pub mod config;

// Upstream retrieval and orchestration
pub mod ingest;

// Processed-transaction fan-out
pub mod transport;

// HTTP history endpoint
pub mod api;

// Re-export commonly used types for convenience
pub use config::{ConfigError, Credentials, Settings};
pub use helius_watch_core::{ProcessedTransaction, RawTransaction, TransactionStatus};
pub use ingest::{FetchError, FetchOutcome, HeliusClient, PollOutcome, TransactionPoller, TransactionSource};
pub use transport::TransactionBus;
