//! Bearer-token enforcement for both ingress transports.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::auth::{AuthGate, AUTHORIZATION_HEADER, UNAUTHORIZED_BODY};
use std::sync::Arc;
use tonic::{service::Interceptor, Status};

/// Axum middleware rejecting requests without the expected bearer token.
///
/// Rejected requests get `401 Unauthorized` with a plain-text body and never
/// reach the handler.
pub async fn require_bearer(
    State(gate): State<Arc<AuthGate>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = gate.check(
        request
            .headers()
            .get(header::AUTHORIZATION)
            .map(axum::http::HeaderValue::as_bytes),
    );

    match verdict {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            tracing::debug!(
                path = %request.uri().path(),
                reason = %reason,
                "Rejected unauthenticated HTTP request"
            );
            (
                StatusCode::UNAUTHORIZED,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                UNAUTHORIZED_BODY,
            )
                .into_response()
        }
    }
}

/// gRPC interceptor failing calls without the expected bearer token.
#[derive(Clone)]
pub struct BearerInterceptor {
    gate: Arc<AuthGate>,
}

impl BearerInterceptor {
    /// Creates an interceptor backed by `gate`.
    #[must_use]
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self { gate }
    }
}

impl Interceptor for BearerInterceptor {
    fn call(&mut self, request: tonic::Request<()>) -> Result<tonic::Request<()>, Status> {
        let verdict = self.gate.check(
            request
                .metadata()
                .get(AUTHORIZATION_HEADER)
                .map(tonic::metadata::MetadataValue::as_bytes),
        );

        if let Err(reason) = verdict {
            tracing::debug!(reason = %reason, "Rejected unauthenticated gRPC call");
            return Err(Status::unauthenticated(UNAUTHORIZED_BODY));
        }
        Ok(request)
    }
}
