//! Transaction model, validation and normalization for the Helius wallet watcher.
//!
//! Nothing in this crate performs I/O. Raw upstream records go in, normalized
//! records (or a skip reason) come out.

pub mod address;
pub mod normalize;
pub mod types;
pub mod validation;

pub use address::is_valid_wallet_address;
pub use normalize::{normalize, process};
pub use types::*;
pub use validation::{validate, SkipReason, ValidTransaction};
