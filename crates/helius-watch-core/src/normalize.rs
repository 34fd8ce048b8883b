/// Field-level normalization of validated records

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::types::{ProcessedTransaction, RawInstruction, RawTransaction, TransactionStatus};
use crate::validation::{validate, SkipReason, ValidTransaction};

const MEMO_INSTRUCTION: &str = "memo";
const TRANSFER_INSTRUCTION: &str = "transfer";

/// Map a validated record into its normalized form. Pure: the same input
/// always yields the same output.
pub fn normalize(tx: &ValidTransaction<'_>) -> ProcessedTransaction {
    let instructions = &tx.message.instructions;
    let account_keys = &tx.message.account_keys;

    let memo = first_of_type(instructions, MEMO_INSTRUCTION)
        .and_then(|info| info.get("memo"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let amount = first_of_type(instructions, TRANSFER_INSTRUCTION)
        .and_then(|info| info.get("lamports"))
        .and_then(Value::as_u64);

    let processed = ProcessedTransaction {
        signature: tx.raw.signature.clone(),
        slot: tx.raw.slot,
        block_time: block_time(tx.raw.block_time),
        fee: tx.meta.fee,
        status: status(tx.meta.err.as_ref()),
        memo,
        source_address: account_keys.first().map(|key| key.pubkey().to_owned()),
        destination_address: account_keys.get(1).map(|key| key.pubkey().to_owned()),
        amount,
    };

    debug!(signature = %processed.signature, "Normalized transaction");
    processed
}

/// Validate then normalize.
pub fn process(raw: &RawTransaction) -> Result<ProcessedTransaction, SkipReason> {
    validate(raw).map(|valid| normalize(&valid))
}

/// `info` of the first instruction tagged `kind`. Later matches are ignored,
/// even when the first one has no `info`.
fn first_of_type<'a>(instructions: &'a [RawInstruction], kind: &str) -> Option<&'a Value> {
    instructions
        .iter()
        .find(|ix| ix.parsed_type() == Some(kind))
        .and_then(RawInstruction::info)
}

fn status(err: Option<&Value>) -> TransactionStatus {
    if err.is_some_and(is_set) {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Success
    }
}

/// Empty strings, `false` and zero count as "no error".
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Epoch seconds to a millisecond timestamp. Zero means unset.
fn block_time(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds
        .filter(|&s| s != 0)
        .and_then(|s| s.checked_mul(1000))
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}
