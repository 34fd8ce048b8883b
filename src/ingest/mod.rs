/// Upstream retrieval and the two orchestration paths built on it

pub mod fetcher;
pub mod poller;

pub use fetcher::{FetchError, FetchOutcome, HeliusClient, TransactionSource};
pub use poller::{Cursor, PollOutcome, TransactionPoller};
