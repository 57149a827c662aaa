//! OTLP HTTP receiver endpoints.
//!
//! Supports both protobuf (`application/x-protobuf`) and JSON
//! (`application/json`) request bodies; the response uses the same encoding
//! as the request.
//!
//! # Endpoints
//!
//! - `POST /v1/logs` - Ingest OTLP logs
//! - `POST /v1/metrics` - Ingest OTLP metrics
//! - `POST /v1/traces` - Ingest OTLP traces

use crate::export::{logs_response, metrics_response, trace_response};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use prost::Message;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::otlp::proto::collector::{
    logs::v1::ExportLogsServiceRequest, metrics::v1::ExportMetricsServiceRequest,
    trace::v1::ExportTraceServiceRequest,
};

/// Content type for protobuf requests.
const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";

/// Error response for OTLP endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct OtlpError {
    /// Error code.
    pub code: u32,
    /// Error message.
    pub message: String,
}

type OtlpRejection = (StatusCode, Json<OtlpError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Protobuf,
    Json,
}

impl Encoding {
    /// Determines the body encoding from the Content-Type header.
    fn from_headers(headers: &HeaderMap) -> Self {
        let protobuf = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(CONTENT_TYPE_PROTOBUF));
        if protobuf {
            Self::Protobuf
        } else {
            Self::Json
        }
    }
}

/// Creates the OTLP routes with application state.
pub fn otlp_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/logs", post(ingest_logs))
        .route("/v1/metrics", post(ingest_metrics))
        .route("/v1/traces", post(ingest_traces))
        .with_state(state)
}

fn decode<T>(encoding: Encoding, body: Bytes, signal: &str) -> Result<T, OtlpRejection>
where
    T: Message + Default + DeserializeOwned,
{
    let decoded = match encoding {
        Encoding::Protobuf => T::decode(body).map_err(|e| format!("Failed to decode protobuf: {e}")),
        Encoding::Json => {
            serde_json::from_slice(&body).map_err(|e| format!("Failed to decode JSON: {e}"))
        }
    };

    decoded.map_err(|message| {
        tracing::warn!(signal, error = %message, "Rejected malformed OTLP request");
        (
            StatusCode::BAD_REQUEST,
            Json(OtlpError {
                code: 400,
                message,
            }),
        )
    })
}

fn encode<T>(encoding: Encoding, response: &T) -> Response
where
    T: Message + Serialize,
{
    match encoding {
        Encoding::Protobuf => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)],
            response.encode_to_vec(),
        )
            .into_response(),
        Encoding::Json => (StatusCode::OK, Json(response)).into_response(),
    }
}

/// Handler for OTLP logs ingestion.
async fn ingest_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OtlpRejection> {
    let encoding = Encoding::from_headers(&headers);
    let request: ExportLogsServiceRequest = decode(encoding, body, "logs")?;

    let summary = state.pipeline().ingest_logs(&request);

    Ok(encode(encoding, &logs_response(&summary)))
}

/// Handler for OTLP metrics ingestion.
async fn ingest_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OtlpRejection> {
    let encoding = Encoding::from_headers(&headers);
    let request: ExportMetricsServiceRequest = decode(encoding, body, "metrics")?;

    let summary = state.pipeline().ingest_metrics(&request);

    Ok(encode(encoding, &metrics_response(&summary)))
}

/// Handler for OTLP traces ingestion.
async fn ingest_traces(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OtlpRejection> {
    let encoding = Encoding::from_headers(&headers);
    let request: ExportTraceServiceRequest = decode(encoding, body, "traces")?;

    let summary = state.pipeline().ingest_traces(&request);

    Ok(encode(encoding, &trace_response(&summary)))
}
