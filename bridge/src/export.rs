//! OTLP export responses shared by the HTTP and gRPC receivers.

use shared::otlp::proto::collector::{
    logs::v1::{ExportLogsPartialSuccess, ExportLogsServiceResponse},
    metrics::v1::{ExportMetricsPartialSuccess, ExportMetricsServiceResponse},
    trace::v1::{ExportTracePartialSuccess, ExportTraceServiceResponse},
};
use shared::pipeline::IngestSummary;

fn rejected(summary: &IngestSummary) -> Option<i64> {
    let rejected = summary.points.rejected;
    (rejected > 0).then(|| i64::try_from(rejected).unwrap_or(i64::MAX))
}

/// Builds the trace export response, reporting points that were not queued.
#[must_use]
pub fn trace_response(summary: &IngestSummary) -> ExportTraceServiceResponse {
    ExportTraceServiceResponse {
        partial_success: rejected(summary).map(|rejected_spans| ExportTracePartialSuccess {
            rejected_spans,
            error_message: format!("{rejected_spans} spans were rejected"),
        }),
    }
}

/// Builds the metrics export response, reporting points that were not queued.
#[must_use]
pub fn metrics_response(summary: &IngestSummary) -> ExportMetricsServiceResponse {
    ExportMetricsServiceResponse {
        partial_success: rejected(summary).map(|rejected_data_points| {
            ExportMetricsPartialSuccess {
                rejected_data_points,
                error_message: format!("{rejected_data_points} data points were rejected"),
            }
        }),
    }
}

/// Builds the logs export response, reporting points that were not queued.
#[must_use]
pub fn logs_response(summary: &IngestSummary) -> ExportLogsServiceResponse {
    ExportLogsServiceResponse {
        partial_success: rejected(summary).map(|rejected_log_records| ExportLogsPartialSuccess {
            rejected_log_records,
            error_message: format!("{rejected_log_records} log records were rejected"),
        }),
    }
}
