//! Integration tests for the health endpoint.

use axum::http::StatusCode;

use super::common::{get, post_json, test_app};

#[tokio::test]
async fn test_health_check() {
    let (app, _state, _sink) = test_app();

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "otelflux");
}

#[tokio::test]
async fn test_health_reports_dispatch_counters() {
    let (app, state, _sink) = test_app();

    let body = r#"{
        "resourceLogs": [{
            "scopeLogs": [{
                "logRecords": [
                    {"timeUnixNano": "1700000000000000000", "body": {"stringValue": "one"}},
                    {"timeUnixNano": "1700000000000000000", "body": {"stringValue": "two"}}
                ]
            }]
        }]
    }"#;
    let (status, _) = post_json(app.clone(), "/v1/logs", body).await;
    assert_eq!(status, StatusCode::OK);

    state.dispatcher().shutdown().await;

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["dispatch"]["enqueued"], 2);
    assert_eq!(response["dispatch"]["written"], 2);
    assert_eq!(response["dispatch"]["failed"], 0);
    assert_eq!(response["dispatch"]["dropped"], 0);
    assert_eq!(response["dispatch"]["queued"], 0);
    assert_eq!(response["dispatch"]["in_flight"], 0);
}
