use super::{PointBuilder, NULL_TAG_VALUE};
use crate::models::{LogEntry, Point};

/// Measurement used for log points.
pub const LOGS_MEASUREMENT: &str = "logs";

/// Prefix applied to attributes whose key collides with a reserved tag.
pub const ATTRIBUTE_COLLISION_PREFIX: &str = "attr.";

const RESERVED_TAGS: [&str; 2] = ["severity", "category"];

/// Builds one `logs` point per log entry.
///
/// Reserved tags always keep their value. An attribute named like a reserved
/// tag is stored under `attr.<key>` instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPointBuilder;

impl PointBuilder for LogPointBuilder {
    type Record = LogEntry;

    fn build(&self, entry: &LogEntry) -> Vec<Point> {
        let mut point = Point::new(LOGS_MEASUREMENT, entry.timestamp)
            .with_tag("severity", entry.severity.as_str())
            .with_tag("category", entry.category.as_deref().unwrap_or("unknown"))
            .with_field("message", entry.message());

        for (key, value) in &entry.attributes {
            let value = value.as_deref().unwrap_or(NULL_TAG_VALUE);
            if RESERVED_TAGS.contains(&key.as_str()) {
                point = point.with_tag(format!("{ATTRIBUTE_COLLISION_PREFIX}{key}"), value);
            } else {
                point = point.with_tag(key.as_str(), value);
            }
        }

        vec![point]
    }
}
