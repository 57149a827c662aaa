//! Integration tests for OTLP/HTTP ingestion.
//!
//! Tests cover:
//! - Protobuf and JSON request bodies, and matching response encodings
//! - The point written for each signal kind
//! - Malformed bodies
//! - Concurrent mixed requests

use axum::http::StatusCode;
use prost::Message;
use shared::models::FieldValue;
use shared::otlp::proto;

use super::common::{post, post_json, test_app, BEARER};

const JAN_1_2024_NANOS: u64 = 1_704_067_200_000_000_000;

fn users_span() -> proto::trace::v1::Span {
    proto::trace::v1::Span {
        trace_id: vec![0x5b; 16],
        span_id: vec![0xee; 8],
        name: "GET /users".to_string(),
        start_time_unix_nano: JAN_1_2024_NANOS,
        end_time_unix_nano: JAN_1_2024_NANOS + 12_340_000,
        status: Some(proto::trace::v1::Status {
            code: proto::trace::v1::status::StatusCode::Ok as i32,
            message: String::new(),
        }),
        ..Default::default()
    }
}

fn trace_request(spans: Vec<proto::trace::v1::Span>) -> proto::collector::trace::v1::ExportTraceServiceRequest {
    proto::collector::trace::v1::ExportTraceServiceRequest {
        resource_spans: vec![proto::trace::v1::ResourceSpans {
            scope_spans: vec![proto::trace::v1::ScopeSpans {
                spans,
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

#[tokio::test]
async fn test_protobuf_span_end_to_end() {
    let (app, state, sink) = test_app();

    let (status, body) = post(
        app,
        "/v1/traces",
        "application/x-protobuf",
        Some(BEARER),
        trace_request(vec![users_span()]).encode_to_vec(),
    )
    .await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::OK);
    let response =
        proto::collector::trace::v1::ExportTraceServiceResponse::decode(body.as_slice()).unwrap();
    assert!(response.partial_success.is_none());

    let writes = sink.writes().unwrap();
    assert_eq!(writes.len(), 1);
    let write = &writes[0];
    assert_eq!(write.target.bucket, "telemetry");
    assert_eq!(write.target.organization, "acme");
    assert_eq!(write.point.measurement(), "traces");
    assert_eq!(write.point.tags().len(), 2);
    assert_eq!(write.point.tag("operation"), Some("GET /users"));
    assert_eq!(write.point.tag("status"), Some("Ok"));
    assert_eq!(write.point.fields().len(), 1);
    assert_eq!(
        write.point.field("duration_ms"),
        Some(&FieldValue::Float(12.34))
    );
    assert_eq!(
        write.point.timestamp().to_rfc3339(),
        "2024-01-01T00:00:00+00:00"
    );
}

#[tokio::test]
async fn test_json_span_ingestion() {
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

    let (status, response) = post_json(app, "/v1/traces", body).await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.is_object());

    let writes = sink.writes_for("traces").unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].point.tag("operation"), Some("GET /users"));
    assert_eq!(writes[0].point.tag("status"), Some("Unset"));
    assert_eq!(writes[0].point.timestamp_millis(), 1_704_067_200_000);
}

#[tokio::test]
async fn test_json_log_ingestion() {
    let (app, state, sink) = test_app();

    let body = r#"{
        "resourceLogs": [{
            "scopeLogs": [{
                "scope": {"name": "MyApp.Users"},
                "logRecords": [{
                    "timeUnixNano": "1700000000000000000",
                    "severityNumber": 9,
                    "body": {"stringValue": "User 42 logged in"},
                    "attributes": [
                        {"key": "user_id", "value": {"stringValue": "42"}},
                        {"key": "severity", "value": {"stringValue": "spoofed"}}
                    ]
                }]
            }]
        }]
    }"#;

    let (status, _) = post_json(app, "/v1/logs", body).await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::OK);
    let writes = sink.writes_for("logs").unwrap();
    assert_eq!(writes.len(), 1);
    let point = &writes[0].point;
    assert_eq!(point.tag("severity"), Some("INFO"));
    assert_eq!(point.tag("category"), Some("MyApp.Users"));
    assert_eq!(point.tag("user_id"), Some("42"));
    assert_eq!(point.tag("attr.severity"), Some("spoofed"));
    assert_eq!(
        point.field("message"),
        Some(&FieldValue::String("User 42 logged in".to_string()))
    );
    assert_eq!(point.timestamp_millis(), 1_700_000_000_000);
}

#[tokio::test]
async fn test_protobuf_metrics_ingestion() {
    let (app, state, sink) = test_app();

    let sum = proto::metrics::v1::Metric {
        name: "http.requests".to_string(),
        data: Some(proto::metrics::v1::metric::Data::Sum(proto::metrics::v1::Sum {
            data_points: vec![proto::metrics::v1::NumberDataPoint {
                attributes: vec![proto::common::v1::KeyValue {
                    key: "route".to_string(),
                    value: Some(proto::common::v1::AnyValue {
                        value: Some(proto::common::v1::any_value::Value::StringValue(
                            "/users".to_string(),
                        )),
                    }),
                }],
                time_unix_nano: JAN_1_2024_NANOS,
                value: Some(proto::metrics::v1::number_data_point::Value::AsInt(42)),
                ..Default::default()
            }],
            is_monotonic: true,
            ..Default::default()
        })),
        ..Default::default()
    };
    let gauge = proto::metrics::v1::Metric {
        name: "cpu.load".to_string(),
        data: Some(proto::metrics::v1::metric::Data::Gauge(proto::metrics::v1::Gauge {
            data_points: vec![proto::metrics::v1::NumberDataPoint {
                time_unix_nano: JAN_1_2024_NANOS,
                value: Some(proto::metrics::v1::number_data_point::Value::AsDouble(3.5)),
                ..Default::default()
            }],
        })),
        ..Default::default()
    };
    let request = proto::collector::metrics::v1::ExportMetricsServiceRequest {
        resource_metrics: vec![proto::metrics::v1::ResourceMetrics {
            scope_metrics: vec![proto::metrics::v1::ScopeMetrics {
                metrics: vec![sum, gauge],
                ..Default::default()
            }],
            ..Default::default()
        }],
    };

    let (status, _) = post(
        app,
        "/v1/metrics",
        "application/x-protobuf",
        Some(BEARER),
        request.encode_to_vec(),
    )
    .await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::OK);

    let requests = sink.writes_for("http.requests").unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].point.tag("route"), Some("/users"));
    assert_eq!(
        requests[0].point.field("value").and_then(FieldValue::as_f64),
        Some(42.0)
    );

    let load = sink.writes_for("cpu.load").unwrap();
    assert_eq!(load.len(), 1);
    assert_eq!(
        load[0].point.field("value").and_then(FieldValue::as_f64),
        Some(3.5)
    );
}

#[tokio::test]
async fn test_malformed_protobuf_is_bad_request() {
    let (app, state, sink) = test_app();

    let (status, body) = post(
        app,
        "/v1/traces",
        "application/x-protobuf",
        Some(BEARER),
        vec![0xff, 0xff, 0xff, 0xff],
    )
    .await;
    state.dispatcher().shutdown().await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], 400);
    assert!(error["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to decode protobuf"));
    assert_eq!(sink.count().unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _state, _sink) = test_app();

    let (status, error) = post_json(app, "/v1/logs", "{\"resourceLogs\": [").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], 400);
}

#[tokio::test]
async fn test_same_span_twice_is_written_twice() {
    let (app, state, sink) = test_app();
    let body = trace_request(vec![users_span()]).encode_to_vec();

    for _ in 0..2 {
        let (status, _) = post(
            app.clone(),
            "/v1/traces",
            "application/x-protobuf",
            Some(BEARER),
            body.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    state.dispatcher().shutdown().await;

    assert_eq!(sink.writes_for("traces").unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_mixed_requests() {
    let (app, state, sink) = test_app();
    let requests = 40;

    let mut handles = Vec::new();
    for i in 0..requests {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let mut span = users_span();
                span.name = format!("op-{i}");
                post(
                    app,
                    "/v1/traces",
                    "application/x-protobuf",
                    Some(BEARER),
                    trace_request(vec![span]).encode_to_vec(),
                )
                .await
                .0
            } else {
                let body = format!(
                    r#"{{"resourceLogs": [{{"scopeLogs": [{{"logRecords": [{{
                        "timeUnixNano": "1700000000000000000",
                        "severityText": "WARN",
                        "body": {{"stringValue": "log-{i}"}},
                        "attributes": [{{"key": "request", "value": {{"stringValue": "{i}"}}}}]
                    }}]}}]}}]}}"#
                );
                post(app, "/v1/logs", "application/json", Some(BEARER), body)
                    .await
                    .0
            }
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    state.dispatcher().shutdown().await;

    assert_eq!(sink.count().unwrap(), requests);

    let traces = sink.writes_for("traces").unwrap();
    assert_eq!(traces.len(), requests / 2);
    for write in &traces {
        assert!(write.point.tag("operation").unwrap().starts_with("op-"));
        assert!(write.point.field("message").is_none());
        assert!(!write.point.has_tag("request"));
    }

    let logs = sink.writes_for("logs").unwrap();
    assert_eq!(logs.len(), requests / 2);
    for write in &logs {
        let request = write.point.tag("request").unwrap();
        assert_eq!(
            write.point.field("message"),
            Some(&FieldValue::String(format!("log-{request}")))
        );
        assert!(write.point.field("duration_ms").is_none());
    }
}
