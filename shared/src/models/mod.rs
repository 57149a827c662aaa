//! Data models for the otelflux bridge.
//!
//! This module contains the signal records produced from OTLP exports and the
//! `Point` they are converted into.

pub mod log;
pub mod metric;
pub mod point;
pub mod trace;

pub use log::{LogEntry, Severity};
pub use metric::{DistributionSummary, ExportedMetric, MetricSample, MetricType, SampleValue};
pub use point::{truncate_to_millis, FieldValue, Point, PointValidationError};
pub use trace::{SpanRecord, SpanStatus};
