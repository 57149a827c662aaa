//! otelflux bridge server
//!
//! Receives OTLP spans, metrics and logs over gRPC and HTTP, checks the
//! bearer token, converts every signal into time-series points and writes
//! them to InfluxDB through a bounded write queue.
//!
//! # Architecture
//!
//! - OTLP/gRPC receiver (default port 4317), behind a bearer-token interceptor
//! - OTLP/HTTP receiver (default port 4318), behind a bearer-token middleware
//! - `GET /health` with write dispatcher counters, unauthenticated
//!
//! # Example
//!
//! ```no_run
//! use bridge::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
mod export;
pub mod grpc;
mod routes;
pub mod state;

pub use config::{Config, ConfigError, LogFormat, Settings, SinkKind};
pub use routes::OtlpError;
pub use state::AppState;

use anyhow::Result;
use auth::{require_bearer, BearerInterceptor};
use axum::{extract::DefaultBodyLimit, middleware, Router};
use grpc::{LogsServiceImpl, MetricsServiceImpl, TracesServiceImpl};
use shared::otlp::proto::collector::{
    logs::v1::logs_service_server::LogsServiceServer,
    metrics::v1::metrics_service_server::MetricsServiceServer,
    trace::v1::trace_service_server::TraceServiceServer,
};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tonic::transport::{server::Router as GrpcRouter, Server as TonicServer};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Runs the bridge with configuration from environment variables.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - A server fails to bind to its configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the bridge with the provided configuration.
///
/// Both receivers stop on SIGTERM/SIGINT and finish their in-flight requests;
/// the write queue is then drained within the configured grace period.
///
/// # Errors
///
/// Returns an error if:
/// - The store client cannot be created
/// - A server fails to bind to its configured address
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let grpc_addr = config.grpc_addr();
    let http_addr = config.http_addr();

    tracing::info!(
        grpc = %grpc_addr,
        http = %http_addr,
        sink = ?config.sink,
        bucket = %config.settings.bucket,
        organization = %config.settings.organization,
        "otelflux bridge starting"
    );

    let state = AppState::from_config(config)?;

    let http_listener = TcpListener::bind(http_addr).await?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_tx = Arc::new(stop_tx);
    let signal_task = tokio::spawn({
        let stop_tx = Arc::clone(&stop_tx);
        async move {
            shutdown_signal().await;
            stop_tx.send_replace(true);
        }
    });

    let grpc_server = create_grpc_router(state.clone())
        .serve_with_shutdown(grpc_addr, stopped(stop_rx.clone()));
    let http_server = axum::serve(http_listener, create_router(state.clone()))
        .with_graceful_shutdown(stopped(stop_rx))
        .into_future();

    tracing::info!(grpc = %grpc_addr, http = %http_addr, "Listening for connections");

    let served = serve_both(grpc_server, http_server, &stop_tx).await;
    signal_task.abort();

    let report = state.dispatcher().shutdown().await;
    tracing::info!(
        drained = report.drained,
        lost = report.lost,
        "Server shutdown complete"
    );
    served
}

/// Creates the HTTP router with all routes and middleware.
///
/// The OTLP routes sit behind the bearer-token middleware; `/health` does
/// not. This function is public to allow testing the router without
/// starting a full server.
pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config().max_body_bytes;

    let ingest = routes::otlp_routes(state.clone())
        .layer(middleware::from_fn_with_state(state.gate(), require_bearer));

    Router::new()
        .merge(routes::health_routes(state))
        .merge(ingest)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Creates the gRPC router with the three OTLP collector services.
///
/// Every service is wrapped in the bearer-token interceptor.
pub fn create_grpc_router(state: AppState) -> GrpcRouter {
    let interceptor = BearerInterceptor::new(state.gate());

    TonicServer::builder()
        .add_service(TraceServiceServer::with_interceptor(
            TracesServiceImpl::new(state.clone()),
            interceptor.clone(),
        ))
        .add_service(MetricsServiceServer::with_interceptor(
            MetricsServiceImpl::new(state.clone()),
            interceptor.clone(),
        ))
        .add_service(LogsServiceServer::with_interceptor(
            LogsServiceImpl::new(state),
            interceptor,
        ))
}

/// Runs both receivers until each has finished its graceful shutdown.
///
/// A receiver that fails raises `stop` so the other one shuts down as well.
async fn serve_both<G, H, GE, HE>(grpc: G, http: H, stop: &watch::Sender<bool>) -> Result<()>
where
    G: Future<Output = std::result::Result<(), GE>>,
    H: Future<Output = std::result::Result<(), HE>>,
    GE: Into<anyhow::Error>,
    HE: Into<anyhow::Error>,
{
    let grpc = async {
        let result: Result<()> = grpc.await.map_err(Into::into);
        if let Err(e) = &result {
            tracing::error!(error = %e, "gRPC server error");
            stop.send_replace(true);
        }
        result
    };
    let http = async {
        let result: Result<()> = http.await.map_err(Into::into);
        if let Err(e) = &result {
            tracing::error!(error = %e, "HTTP server error");
            stop.send_replace(true);
        }
        result
    };

    let (grpc, http) = tokio::join!(grpc, http);
    grpc.and(http)
}

/// Resolves once `stop` is raised or its sender is gone.
async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
