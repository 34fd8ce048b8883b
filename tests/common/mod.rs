#![allow(dead_code)]

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use helius_watch::{Credentials, FetchError, FetchOutcome, RawTransaction, Settings, TransactionSource};
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const WALLET: &str = "EgqxBkbNczXsgBmnkQ6VyKF6qRK446UGMgWhMed1L9c6";
pub const API_KEY: &str = "test-api-key";

pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

pub fn configured() -> Settings {
    settings(&[("WALLET_ADDRESS", WALLET), ("HELIUS_API_KEY", API_KEY)])
}

pub fn raw_json(signature: &str, slot: u64) -> Value {
    json!({
        "signature": signature,
        "slot": slot,
        "blockTime": 1_700_000_000i64 + slot as i64,
        "meta": {
            "fee": 5000,
            "err": null,
            "preBalances": [1_000_000_000u64, 0],
            "postBalances": [899_995_000u64, 100_000_000],
            "innerInstructions": [],
            "logMessages": ["Program 11111111111111111111111111111111 success"]
        },
        "transaction": {
            "signatures": [signature],
            "message": {
                "accountKeys": [WALLET, "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"],
                "instructions": [{
                    "program": "system",
                    "programId": "11111111111111111111111111111111",
                    "parsed": {
                        "type": "transfer",
                        "info": {
                            "source": WALLET,
                            "destination": "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
                            "lamports": 100_000_000u64
                        }
                    }
                }],
                "recentBlockhash": "11111111111111111111111111111111"
            }
        }
    })
}

pub fn raw(signature: &str, slot: u64) -> RawTransaction {
    serde_json::from_value(raw_json(signature, slot)).unwrap()
}

pub fn without_meta(signature: &str, slot: u64) -> RawTransaction {
    let mut tx = raw(signature, slot);
    tx.meta = None;
    tx
}

pub fn without_message(signature: &str, slot: u64) -> RawTransaction {
    let mut tx = raw(signature, slot);
    if let Some(body) = tx.transaction.as_mut() {
        body.message = None;
    }
    tx
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub wallet_address: String,
    pub limit: u32,
    pub before: Option<String>,
}

/// Scripted source: hands out queued responses in order, then empty pages.
#[derive(Default)]
pub struct MockSource {
    responses: Mutex<VecDeque<Result<FetchOutcome, FetchError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch signals `entered` and then waits on `release`.
    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::default()
        }
    }

    pub fn push_page(&self, records: Vec<RawTransaction>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(FetchOutcome::from_records(records)));
        self
    }

    pub fn push_error(&self, error: FetchError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSource for MockSource {
    async fn fetch(
        &self,
        credentials: &Credentials,
        limit: NonZeroU32,
        before: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.lock().unwrap().push(Call {
            wallet_address: credentials.wallet_address.clone(),
            limit: limit.get(),
            before: before.map(str::to_string),
        });

        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(FetchOutcome::Empty))
    }
}
