//! Integration tests for bearer-token enforcement on the HTTP receiver.

use axum::http::StatusCode;

use super::common::{post, test_app, BEARER};

const EMPTY_TRACES: &str = r#"{"resourceSpans": []}"#;

async fn post_traces(authorization: Option<&str>) -> (StatusCode, String) {
    let (app, _state, _sink) = test_app();
    let (status, body) = post(
        app,
        "/v1/traces",
        "application/json",
        authorization,
        EMPTY_TRACES,
    )
    .await;
    (status, String::from_utf8(body).unwrap())
}

#[tokio::test]
async fn test_expected_token_is_accepted() {
    let (status, _) = post_traces(Some(BEARER)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let (status, body) = post_traces(None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid or missing token");
}

#[tokio::test]
async fn test_rejected_values() {
    for value in [
        "test-client-token",
        "bearer test-client-token",
        "BEARER test-client-token",
        "Bearer  test-client-token",
        "Bearer test-client-token ",
        "Bearer TEST-CLIENT-TOKEN",
        "Bearer other-token",
        "Basic dGVzdA==",
        "",
    ] {
        let (status, body) = post_traces(Some(value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "accepted {value:?}");
        assert_eq!(body, "Invalid or missing token");
    }
}

#[tokio::test]
async fn test_rejected_request_writes_nothing() {
    let (app, state, sink) = test_app();
    let body = r#"{
        "resourceSpans": [{
            "scopeSpans": [{
                "spans": [{
                    "traceId": "5b8efff798038103d269b633813fc60c",
                    "spanId": "eee19b7ec3c1b174",
                    "name": "GET /users",
                    "startTimeUnixNano": "1704067200000000000",
                    "endTimeUnixNano": "1704067200012340000"
                }]
            }]
        }]
    }"#;

    let (status, _) = post(
        app,
        "/v1/traces",
        "application/json",
        Some("Bearer wrong"),
        body,
    )
    .await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(sink.count().unwrap(), 0);
    assert_eq!(state.dispatcher().stats().enqueued, 0);
}
