//! Common test utilities and helpers for integration tests.
//!
//! Every test app writes to an in-memory sink, so tests can inspect exactly
//! which points reached the store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bridge::{create_router, AppState, Config, Settings};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::sink::InMemorySink;
use std::sync::Arc;

/// Token the test apps expect from clients.
pub const CLIENT_TOKEN: &str = "test-client-token";

/// `authorization` header value the test apps accept.
pub const BEARER: &str = "Bearer test-client-token";

/// Returns a configuration pointing at a dummy store.
pub fn test_config() -> Config {
    Config::new(Settings::new(
        "http://localhost:8086",
        "store-token",
        "telemetry",
        "acme",
        CLIENT_TOKEN,
    ))
}

/// Creates a test router backed by a fresh in-memory sink.
///
/// # Returns
///
/// The router, the app state and the sink points are written to.
pub fn test_app() -> (Router, AppState, Arc<InMemorySink>) {
    let (state, sink) = AppState::with_in_memory_sink(test_config());
    let router = create_router(state.clone());
    (router, state, sink)
}

/// Sends a POST request and returns the status and raw response body.
///
/// # Arguments
///
/// * `app` - The Axum router to send the request to
/// * `uri` - The URI path to POST to
/// * `content_type` - Value of the Content-Type header
/// * `authorization` - Value of the authorization header, if any
/// * `body` - The request body
pub async fn post(
    app: Router,
    uri: &str,
    content_type: &str,
    authorization: Option<&str>,
    body: impl Into<Body>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    let response = tower::ServiceExt::oneshot(app, builder.body(body.into()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, body_bytes.to_vec())
}

/// Helper to make an authenticated POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, bytes) = post(app, uri, "application/json", Some(BEARER), body.to_string()).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Helper to make a GET request.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}
