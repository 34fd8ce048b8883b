mod common;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::*;
use helius_watch::api::{history, ApiError, HistoryParams};
use helius_watch::{TransactionBus, TransactionPoller};

fn state(source: Arc<MockSource>) -> State<Arc<TransactionPoller>> {
    State(Arc::new(TransactionPoller::new(source, configured(), TransactionBus::new())))
}

fn params(limit: Option<&str>, before: Option<&str>) -> Query<HistoryParams> {
    Query(HistoryParams {
        limit: limit.map(str::to_string),
        before_signature: before.map(str::to_string),
    })
}

#[tokio::test]
async fn test_history_uses_default_limit() {
    let source = Arc::new(MockSource::new());
    source.push_page(vec![raw("B", 2), raw("A", 1)]);

    let response = history(state(source.clone()), params(None, None)).await.unwrap();

    assert_eq!(response.0.len(), 2);
    let calls = source.calls();
    assert_eq!(calls[0].limit, 50);
    assert_eq!(calls[0].before, None);
}

#[tokio::test]
async fn test_history_forwards_limit_and_cursor() {
    let source = Arc::new(MockSource::new());
    history(state(source.clone()), params(Some("20"), Some("abc123")))
        .await
        .unwrap();

    let calls = source.calls();
    assert_eq!(calls[0].limit, 20);
    assert_eq!(calls[0].before.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_blank_cursor_is_ignored() {
    let source = Arc::new(MockSource::new());
    history(state(source.clone()), params(Some("5"), Some(""))).await.unwrap();
    assert_eq!(source.calls()[0].before, None);
}

#[tokio::test]
async fn test_bad_limit_rejected_before_fetch() {
    for limit in ["0", "-5", "abc"] {
        let source = Arc::new(MockSource::new());
        source.push_page(vec![raw("A", 1)]);

        let err = history(state(source.clone()), params(Some(limit), None))
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::InvalidLimit(limit.to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(source.calls().is_empty());
    }
}

#[tokio::test]
async fn test_history_serializes_processed_shape() {
    let source = Arc::new(MockSource::new());
    source.push_page(vec![raw("A", 1)]);

    let response = history(state(source), params(None, None)).await.unwrap();
    let body = serde_json::to_value(&response.0).unwrap();

    assert_eq!(body[0]["signature"], "A");
    assert_eq!(body[0]["status"], "success");
    assert_eq!(body[0]["fee"], 5000);
    assert_eq!(body[0]["amount"], 100_000_000);
    assert_eq!(body[0]["sourceAddress"], WALLET);
    assert_eq!(body[0]["destinationAddress"], "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM");
    assert!(body[0]["memo"].is_null());
    assert_eq!(body[0]["blockTime"], "2023-11-14T22:13:21Z");
}
