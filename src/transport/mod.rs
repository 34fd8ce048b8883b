pub mod transaction_bus;

pub use transaction_bus::TransactionBus;
