use helius_watch_core::ProcessedTransaction;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

const BUS_CAPACITY: usize = 1000;

/// Fan-out of transactions processed by the periodic poll.
#[derive(Debug, Clone)]
pub struct TransactionBus {
    tx: broadcast::Sender<ProcessedTransaction>,
}

impl TransactionBus {
    #[instrument]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        debug!("TransactionBus initialized with capacity: {}", BUS_CAPACITY);
        Self { tx }
    }

    /// Returns the number of subscribers that received the record. Having none
    /// is not an error.
    #[instrument(skip(self, transaction), fields(signature = %transaction.signature))]
    pub fn publish(&self, transaction: ProcessedTransaction) -> usize {
        match self.tx.send(transaction) {
            Ok(subscriber_count) => {
                debug!(subscriber_count, "Published transaction to bus");
                subscriber_count
            }
            Err(_) => {
                debug!("No subscribers on transaction bus");
                0
            }
        }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessedTransaction> {
        let receiver = self.tx.subscribe();
        debug!("New subscriber added to transaction bus");
        receiver
    }
}

impl Default for TransactionBus {
    fn default() -> Self {
        Self::new()
    }
}
