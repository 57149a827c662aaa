//! gRPC service implementations for OTLP collectors.

use crate::export::{logs_response, metrics_response, trace_response};
use crate::state::AppState;
use shared::otlp::proto::collector::{
    logs::v1::{logs_service_server::LogsService, ExportLogsServiceRequest, ExportLogsServiceResponse},
    metrics::v1::{
        metrics_service_server::MetricsService, ExportMetricsServiceRequest,
        ExportMetricsServiceResponse,
    },
    trace::v1::{
        trace_service_server::TraceService, ExportTraceServiceRequest, ExportTraceServiceResponse,
    },
};
use tonic::{Request, Response, Status};

/// Implementation of the OTLP `LogsService` gRPC service.
#[derive(Clone)]
pub struct LogsServiceImpl {
    state: AppState,
}

impl LogsServiceImpl {
    /// Creates a new `LogsServiceImpl` with the given application state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl LogsService for LogsServiceImpl {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let summary = self.state.pipeline().ingest_logs(request.get_ref());
        Ok(Response::new(logs_response(&summary)))
    }
}

/// Implementation of the OTLP `MetricsService` gRPC service.
#[derive(Clone)]
pub struct MetricsServiceImpl {
    state: AppState,
}

impl MetricsServiceImpl {
    /// Creates a new `MetricsServiceImpl` with the given application state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl MetricsService for MetricsServiceImpl {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        let summary = self.state.pipeline().ingest_metrics(request.get_ref());
        Ok(Response::new(metrics_response(&summary)))
    }
}

/// Implementation of the OTLP `TraceService` gRPC service.
#[derive(Clone)]
pub struct TracesServiceImpl {
    state: AppState,
}

impl TracesServiceImpl {
    /// Creates a new `TracesServiceImpl` with the given application state.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl TraceService for TracesServiceImpl {
    async fn export(
        &self,
        request: Request<ExportTraceServiceRequest>,
    ) -> Result<Response<ExportTraceServiceResponse>, Status> {
        let summary = self.state.pipeline().ingest_traces(request.get_ref());
        Ok(Response::new(trace_response(&summary)))
    }
}
