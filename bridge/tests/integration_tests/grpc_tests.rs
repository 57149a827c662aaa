//! Integration tests for OTLP gRPC endpoints.
//!
//! The trace tests run a real gRPC server on a local port so the bearer
//! interceptor is exercised over the wire.

use super::common::{test_app, BEARER};
use bridge::{create_grpc_router, AppState};
use shared::models::FieldValue;
use shared::otlp::proto;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tonic::transport::Channel;

use proto::collector::trace::v1::trace_service_client::TraceServiceClient;

async fn start_grpc(state: AppState) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        create_grpc_router(state)
            .serve_with_shutdown(addr, async {
                stop_rx.await.ok();
            })
            .await
            .unwrap();
    });

    (addr, stop_tx)
}

async fn connect(addr: SocketAddr) -> TraceServiceClient<Channel> {
    for _ in 0..100 {
        let endpoint = Channel::from_shared(format!("http://{addr}")).unwrap();
        if let Ok(channel) = endpoint.connect().await {
            return TraceServiceClient::new(channel);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("gRPC server at {addr} did not come up");
}

fn trace_request() -> proto::collector::trace::v1::ExportTraceServiceRequest {
    proto::collector::trace::v1::ExportTraceServiceRequest {
        resource_spans: vec![proto::trace::v1::ResourceSpans {
            scope_spans: vec![proto::trace::v1::ScopeSpans {
                spans: vec![proto::trace::v1::Span {
                    trace_id: vec![1; 16],
                    span_id: vec![2; 8],
                    name: "GET /users".to_string(),
                    start_time_unix_nano: 1_704_067_200_000_000_000,
                    end_time_unix_nano: 1_704_067_200_012_340_000,
                    status: Some(proto::trace::v1::Status {
                        code: proto::trace::v1::status::StatusCode::Ok as i32,
                        message: String::new(),
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

#[tokio::test]
async fn test_grpc_export_with_token() {
    let (_router, state, sink) = test_app();
    let (addr, stop) = start_grpc(state.clone()).await;
    let mut client = connect(addr).await;

    let mut request = tonic::Request::new(trace_request());
    request
        .metadata_mut()
        .insert("authorization", BEARER.parse().unwrap());
    let response = client.export(request).await.unwrap();

    stop.send(()).ok();
    state.dispatcher().shutdown().await;

    assert!(response.into_inner().partial_success.is_none());
    let writes = sink.writes_for("traces").unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].point.tag("operation"), Some("GET /users"));
    assert_eq!(writes[0].point.tag("status"), Some("Ok"));
    assert_eq!(
        writes[0].point.field("duration_ms"),
        Some(&FieldValue::Float(12.34))
    );
}

#[tokio::test]
async fn test_grpc_export_without_token_is_unauthenticated() {
    let (_router, state, sink) = test_app();
    let (addr, stop) = start_grpc(state.clone()).await;
    let mut client = connect(addr).await;

    let status = client
        .export(tonic::Request::new(trace_request()))
        .await
        .unwrap_err();

    stop.send(()).ok();
    state.dispatcher().shutdown().await;

    assert_eq!(status.code(), tonic::Code::Unauthenticated);
    assert_eq!(sink.count().unwrap(), 0);
}

#[tokio::test]
async fn test_grpc_export_with_wrong_token_is_unauthenticated() {
    let (_router, state, _sink) = test_app();
    let (addr, stop) = start_grpc(state.clone()).await;
    let mut client = connect(addr).await;

    let mut request = tonic::Request::new(trace_request());
    request
        .metadata_mut()
        .insert("authorization", "Bearer nope".parse().unwrap());
    let status = client.export(request).await.unwrap_err();

    stop.send(()).ok();

    assert_eq!(status.code(), tonic::Code::Unauthenticated);
}

#[tokio::test]
async fn test_grpc_logs_service_integration() {
    let (_router, state, sink) = test_app();
    let service = bridge::grpc::LogsServiceImpl::new(state.clone());

    let request = tonic::Request::new(proto::collector::logs::v1::ExportLogsServiceRequest {
        resource_logs: vec![proto::logs::v1::ResourceLogs {
            scope_logs: vec![proto::logs::v1::ScopeLogs {
                scope: Some(proto::common::v1::InstrumentationScope {
                    name: "integration".to_string(),
                    ..Default::default()
                }),
                log_records: vec![proto::logs::v1::LogRecord {
                    time_unix_nano: 1_700_000_000_000_000_000,
                    severity_number: 17,
                    body: Some(proto::common::v1::AnyValue {
                        value: Some(proto::common::v1::any_value::Value::StringValue(
                            "Integration test log message".to_string(),
                        )),
                    }),
                    attributes: vec![proto::common::v1::KeyValue {
                        key: "tenant".to_string(),
                        value: None,
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }],
    });

    use proto::collector::logs::v1::logs_service_server::LogsService;
    let response = service.export(request).await.unwrap();
    state.dispatcher().shutdown().await;

    assert!(response.into_inner().partial_success.is_none());
    let writes = sink.writes_for("logs").unwrap();
    assert_eq!(writes.len(), 1);
    let point = &writes[0].point;
    assert_eq!(point.tag("severity"), Some("ERROR"));
    assert_eq!(point.tag("category"), Some("integration"));
    assert_eq!(point.tag("tenant"), Some("null"));
    assert_eq!(
        point.field("message"),
        Some(&FieldValue::String("Integration test log message".to_string()))
    );
}

#[tokio::test]
async fn test_grpc_metrics_histogram_is_decomposed() {
    let (_router, state, sink) = test_app();
    let service = bridge::grpc::MetricsServiceImpl::new(state.clone());

    let histogram = proto::metrics::v1::Metric {
        name: "http.latency".to_string(),
        data: Some(proto::metrics::v1::metric::Data::Histogram(
            proto::metrics::v1::Histogram {
                data_points: vec![proto::metrics::v1::HistogramDataPoint {
                    time_unix_nano: 1_704_067_200_000_000_000,
                    count: 4,
                    sum: Some(10.5),
                    min: Some(1.0),
                    max: Some(5.0),
                    ..Default::default()
                }],
                ..Default::default()
            },
        )),
        ..Default::default()
    };
    let request = tonic::Request::new(proto::collector::metrics::v1::ExportMetricsServiceRequest {
        resource_metrics: vec![proto::metrics::v1::ResourceMetrics {
            scope_metrics: vec![proto::metrics::v1::ScopeMetrics {
                metrics: vec![histogram],
                ..Default::default()
            }],
            ..Default::default()
        }],
    });

    use proto::collector::metrics::v1::metrics_service_server::MetricsService;
    service.export(request).await.unwrap();
    state.dispatcher().shutdown().await;

    let writes = sink.writes_for("http.latency").unwrap();
    assert_eq!(writes.len(), 1);
    let point = &writes[0].point;
    assert_eq!(point.field("count"), Some(&FieldValue::Integer(4)));
    assert_eq!(point.field("sum"), Some(&FieldValue::Float(10.5)));
    assert_eq!(point.field("min"), Some(&FieldValue::Float(1.0)));
    assert_eq!(point.field("max"), Some(&FieldValue::Float(5.0)));
    assert!(point.field("value").is_none());
}
