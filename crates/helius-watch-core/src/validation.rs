/// Structural validation of upstream records

use thiserror::Error;

use crate::types::{RawMessage, RawMeta, RawTransaction};

/// Why a record was left out of a batch. Skips are routine, not failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    #[error("missing the 'meta' field")]
    MissingMeta,

    #[error("missing essential 'transaction.message' fields")]
    MissingMessage,
}

/// A record whose `meta` and `transaction.message` are known to be present.
#[derive(Debug, Clone, Copy)]
pub struct ValidTransaction<'a> {
    pub raw: &'a RawTransaction,
    pub meta: &'a RawMeta,
    pub message: &'a RawMessage,
}

pub fn validate(raw: &RawTransaction) -> Result<ValidTransaction<'_>, SkipReason> {
    let meta = raw.meta.as_ref().ok_or(SkipReason::MissingMeta)?;
    let message = raw
        .transaction
        .as_ref()
        .and_then(|body| body.message.as_ref())
        .ok_or(SkipReason::MissingMessage)?;

    Ok(ValidTransaction { raw, meta, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawTransaction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_meta_is_skipped() {
        let tx = raw(json!({
            "signature": "s",
            "slot": 1,
            "transaction": { "message": { "accountKeys": [], "instructions": [] } }
        }));
        assert_eq!(validate(&tx).unwrap_err(), SkipReason::MissingMeta);
    }

    #[test]
    fn test_missing_transaction_or_message_is_skipped() {
        let no_body = raw(json!({ "signature": "s", "slot": 1, "meta": { "fee": 1 } }));
        assert_eq!(validate(&no_body).unwrap_err(), SkipReason::MissingMessage);

        let no_message = raw(json!({
            "signature": "s",
            "slot": 1,
            "meta": { "fee": 1 },
            "transaction": { "signatures": ["s"] }
        }));
        assert_eq!(validate(&no_message).unwrap_err(), SkipReason::MissingMessage);
    }

    #[test]
    fn test_meta_is_checked_first() {
        let tx = raw(json!({ "signature": "s", "slot": 1 }));
        assert_eq!(validate(&tx).unwrap_err(), SkipReason::MissingMeta);
    }

    #[test]
    fn test_complete_record_passes() {
        let tx = raw(json!({
            "signature": "s",
            "slot": 1,
            "meta": {},
            "transaction": { "message": {} }
        }));
        let valid = validate(&tx).unwrap();
        assert_eq!(valid.raw.signature, "s");
        assert!(valid.message.account_keys.is_empty());
    }
}
