use super::PointBuilder;
use crate::models::{Point, SpanRecord};

/// Measurement used for span points.
pub const TRACES_MEASUREMENT: &str = "traces";

/// Builds one `traces` point per completed span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracePointBuilder;

impl PointBuilder for TracePointBuilder {
    type Record = SpanRecord;

    fn build(&self, span: &SpanRecord) -> Vec<Point> {
        vec![Point::new(TRACES_MEASUREMENT, span.start_time)
            .with_tag("operation", span.operation_name.as_str())
            .with_tag("status", span.status.to_string())
            .with_field("duration_ms", span.duration_ms())]
    }
}
