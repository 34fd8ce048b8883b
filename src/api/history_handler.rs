use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use helius_watch_core::ProcessedTransaction;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ingest::TransactionPoller;

pub const DEFAULT_HISTORY_LIMIT: NonZeroU32 = match NonZeroU32::new(50) {
    Some(limit) => limit,
    None => NonZeroU32::MIN,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid limit parameter. It must be a positive integer.")]
    InvalidLimit(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidLimit(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub limit: Option<String>,
    pub before_signature: Option<String>,
}

/// Absent or blank means the default. Anything else must be a positive
/// integer; values past `u32::MAX` are capped.
pub fn parse_limit(raw: Option<&str>) -> Result<NonZeroU32, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_HISTORY_LIMIT),
        Some(raw) => raw,
    };

    let invalid = || ApiError::InvalidLimit(raw.to_string());
    let value = raw.parse::<i64>().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }

    NonZeroU32::new(u32::try_from(value).unwrap_or(u32::MAX)).ok_or_else(invalid)
}

/// `GET /transactions/history?limit=20&beforeSignature=abc123`
pub async fn history(
    State(poller): State<Arc<TransactionPoller>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<ProcessedTransaction>>, ApiError> {
    let limit = parse_limit(params.limit.as_deref()).map_err(|e| {
        warn!(limit = ?params.limit, "Rejected history request: {}", e);
        e
    })?;

    let before = params
        .before_signature
        .as_deref()
        .map(str::trim)
        .filter(|signature| !signature.is_empty());

    let transactions = poller.get_history(limit, before).await;
    debug!(count = transactions.len(), "Serving transaction history");

    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults() {
        assert_eq!(parse_limit(None).unwrap().get(), 50);
        assert_eq!(parse_limit(Some("")).unwrap().get(), 50);
        assert_eq!(parse_limit(Some("  ")).unwrap().get(), 50);
    }

    #[test]
    fn test_limit_accepts_positive_integers() {
        assert_eq!(parse_limit(Some("1")).unwrap().get(), 1);
        assert_eq!(parse_limit(Some("20")).unwrap().get(), 20);
        assert_eq!(parse_limit(Some("99999999999")).unwrap().get(), u32::MAX);
    }

    #[test]
    fn test_limit_rejects_non_positive_and_non_numeric() {
        for raw in ["0", "-5", "abc", "20abc", "1.5"] {
            assert_eq!(
                parse_limit(Some(raw)).unwrap_err(),
                ApiError::InvalidLimit(raw.to_string()),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_limit_is_bad_request() {
        let response = ApiError::InvalidLimit("0".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
