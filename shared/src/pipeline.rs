//! OTLP export handling.
//!
//! Walks decoded OTLP export requests (resource → scope → record) and hands
//! every record to the processor for its signal kind. Both ingress transports
//! share one `Pipeline`.

use crate::dispatch::WriteDispatcher;
use crate::otlp::conversions::{otlp_log_to_entry, otlp_metric_to_exported, otlp_span_to_record};
use crate::otlp::proto::collector::{
    logs::v1::ExportLogsServiceRequest, metrics::v1::ExportMetricsServiceRequest,
    trace::v1::ExportTraceServiceRequest,
};
use crate::points::{LogPointBuilder, MetricPointBuilder, TracePointBuilder, UnsupportedMetricPolicy};
use crate::processor::{DispatchOutcome, SignalProcessor};

/// Summary of one export request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Records found in the request.
    pub records: usize,
    /// Points queued and rejected for those records.
    pub points: DispatchOutcome,
}

/// The three signal processors sharing one dispatcher.
#[derive(Clone)]
pub struct Pipeline {
    traces: SignalProcessor<TracePointBuilder>,
    metrics: SignalProcessor<MetricPointBuilder>,
    logs: SignalProcessor<LogPointBuilder>,
}

impl Pipeline {
    /// Creates the pipeline.
    #[must_use]
    pub fn new(dispatcher: &WriteDispatcher, metric_policy: UnsupportedMetricPolicy) -> Self {
        Self {
            traces: SignalProcessor::new(TracePointBuilder, dispatcher.clone()),
            metrics: SignalProcessor::new(MetricPointBuilder::new(metric_policy), dispatcher.clone()),
            logs: SignalProcessor::new(LogPointBuilder, dispatcher.clone()),
        }
    }

    /// Handles every span in a trace export request.
    pub fn ingest_traces(&self, request: &ExportTraceServiceRequest) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for resource_spans in &request.resource_spans {
            for scope_spans in &resource_spans.scope_spans {
                for span in &scope_spans.spans {
                    summary.records += 1;
                    summary
                        .points
                        .merge(self.traces.on_complete(&otlp_span_to_record(span)));
                }
            }
        }

        tracing::debug!(
            spans = summary.records,
            accepted = summary.points.accepted,
            rejected = summary.points.rejected,
            "Processed trace export"
        );
        summary
    }

    /// Handles every metric in a metrics export request.
    pub fn ingest_metrics(&self, request: &ExportMetricsServiceRequest) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for resource_metrics in &request.resource_metrics {
            for scope_metrics in &resource_metrics.scope_metrics {
                for metric in &scope_metrics.metrics {
                    summary.records += 1;
                    summary
                        .points
                        .merge(self.metrics.on_complete(&otlp_metric_to_exported(metric)));
                }
            }
        }

        tracing::debug!(
            metrics = summary.records,
            accepted = summary.points.accepted,
            rejected = summary.points.rejected,
            "Processed metrics export"
        );
        summary
    }

    /// Handles every log record in a logs export request.
    ///
    /// The instrumentation scope name becomes the log category.
    pub fn ingest_logs(&self, request: &ExportLogsServiceRequest) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for resource_logs in &request.resource_logs {
            for scope_logs in &resource_logs.scope_logs {
                let scope_name = scope_logs
                    .scope
                    .as_ref()
                    .map_or("", |scope| scope.name.as_str());

                for record in &scope_logs.log_records {
                    summary.records += 1;
                    summary
                        .points
                        .merge(self.logs.on_complete(&otlp_log_to_entry(record, scope_name)));
                }
            }
        }

        tracing::debug!(
            logs = summary.records,
            accepted = summary.points.accepted,
            rejected = summary.points.rejected,
            "Processed logs export"
        );
        summary
    }
}
