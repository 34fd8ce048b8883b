/// Upstream and normalized transaction structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Transaction record as returned by the indexing API. Untrusted: anything
/// below the top level may be missing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<RawMeta>,
    #[serde(default)]
    pub transaction: Option<RawTransactionBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeta {
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pre_balances: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub post_balances: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inner_instructions: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub log_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionBody {
    #[serde(default)]
    pub message: Option<RawMessage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub account_keys: Vec<AccountKey>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub instructions: Vec<RawInstruction>,
    #[serde(default)]
    pub recent_blockhash: Option<String>,
}

/// Account keys arrive either as bare addresses or, with json-parsed
/// encoding, as objects carrying the address in `pubkey`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AccountKey {
    Address(String),
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
    },
}

impl AccountKey {
    pub fn pubkey(&self) -> &str {
        match self {
            AccountKey::Address(address) => address,
            AccountKey::Parsed { pubkey, .. } => pubkey,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    /// `{ "type": ..., "info": {...} }` for parsed programs; other shapes are
    /// kept verbatim and carry no type tag.
    #[serde(default)]
    pub parsed: Option<Value>,
}

impl RawInstruction {
    pub fn parsed_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }

    pub fn info(&self) -> Option<&Value> {
        self.parsed.as_ref()?.get("info")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Normalized transaction handed to log sinks and API callers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<DateTime<Utc>>,
    /// Lamports
    pub fee: Option<u64>,
    pub status: TransactionStatus,
    pub memo: Option<String>,
    pub source_address: Option<String>,
    pub destination_address: Option<String>,
    /// Lamports
    pub amount: Option<u64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
