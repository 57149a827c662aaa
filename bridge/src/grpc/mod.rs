//! OTLP gRPC receiver services.
//!
//! Implements the OpenTelemetry Protocol collector services so standard SDK
//! exporters can send spans, metrics and logs over gRPC. Every service is
//! wrapped in the bearer-token interceptor when registered.
//!
//! # Services
//!
//! - `LogsService` - Receives logs via gRPC
//! - `MetricsService` - Receives metrics via gRPC
//! - `TraceService` - Receives traces via gRPC

mod services;

pub use services::{LogsServiceImpl, MetricsServiceImpl, TracesServiceImpl};
