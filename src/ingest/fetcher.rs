/// Helius transaction-history client
///
/// One GET per call, no retries. The caller decides what a failure means:
/// the poller drops the tick, the history query degrades to an empty page.

use std::num::NonZeroU32;

use async_trait::async_trait;
use helius_watch_core::RawTransaction;
use reqwest::Client;
use thiserror::Error;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{Credentials, Settings};

const REDACTED: &str = "***";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Helius API error: status {status}")]
    Status { status: u16, body: String },

    #[error("Helius request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse Helius response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            FetchError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

// reqwest errors carry the request URL, which includes the API key
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.without_url())
    }
}

/// Result of a successful fetch. A page of zero records is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Non-empty, in upstream order (newest first).
    Batch(Vec<RawTransaction>),
    Empty,
}

impl FetchOutcome {
    pub fn from_records(records: Vec<RawTransaction>) -> Self {
        if records.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Batch(records)
        }
    }

    pub fn into_records(self) -> Vec<RawTransaction> {
        match self {
            FetchOutcome::Batch(records) => records,
            FetchOutcome::Empty => Vec::new(),
        }
    }
}

/// Source of raw transaction pages for a wallet.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch(
        &self,
        credentials: &Credentials,
        limit: NonZeroU32,
        before: Option<&str>,
    ) -> Result<FetchOutcome, FetchError>;
}

pub struct HeliusClient {
    client: Client,
    base_url: Url,
}

impl HeliusClient {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(settings.http_timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    /// `<base>/addresses/{wallet}/transactions?api-key=..&limit=..[&before=..]`
    pub fn transactions_url(
        &self,
        credentials: &Credentials,
        limit: NonZeroU32,
        before: Option<&str>,
    ) -> Url {
        let mut url = self.base_url.clone();
        // Settings only accept base URLs that can carry a path
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["addresses", credentials.wallet_address.as_str(), "transactions"]);
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-key", &credentials.api_key);
            query.append_pair("limit", &limit.to_string());
            if let Some(before) = before {
                query.append_pair("before", before);
            }
        }

        url
    }
}

#[async_trait]
impl TransactionSource for HeliusClient {
    #[instrument(skip(self, credentials), fields(wallet = %credentials.wallet_address))]
    async fn fetch(
        &self,
        credentials: &Credentials,
        limit: NonZeroU32,
        before: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let url = self.transactions_url(credentials, limit, before);
        debug!(url = %redact_api_key(&url), "Requesting transaction history");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let entries: Vec<Value> = serde_json::from_str(&body)?;
        let received = entries.len();
        let records = decode_records(entries);
        debug!(received, decoded = records.len(), "Received transaction page");

        Ok(FetchOutcome::from_records(records))
    }
}

/// Decode page entries one at a time. Entries that do not fit the record
/// shape are logged and dropped; the rest of the page is kept.
pub fn decode_records(entries: Vec<Value>) -> Vec<RawTransaction> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let signature = entry
                .get("signature")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string();
            match serde_json::from_value::<RawTransaction>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%signature, "Transaction {} is malformed ({}). Skipping.", signature, e);
                    None
                }
            }
        })
        .collect()
}

/// Copy of `url` safe to log.
pub fn redact_api_key(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api-key" { REDACTED.to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
