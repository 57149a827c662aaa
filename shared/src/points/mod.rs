//! Point builders.
//!
//! One `PointBuilder` per signal kind maps a signal record to the points that
//! represent it in the store. Builders are pure: no I/O, no shared state.

mod log;
mod metric;
mod trace;

pub use log::{LogPointBuilder, ATTRIBUTE_COLLISION_PREFIX, LOGS_MEASUREMENT};
pub use metric::{MetricPointBuilder, UnsupportedMetricPolicy};
pub use trace::{TracePointBuilder, TRACES_MEASUREMENT};

use crate::models::Point;

/// Converts a record of one signal kind into points.
pub trait PointBuilder: Send + Sync {
    /// The record type this builder accepts.
    type Record: ?Sized;

    /// Builds the points for a single completed record.
    fn build(&self, record: &Self::Record) -> Vec<Point>;
}

/// Rendering used for tags whose value is absent.
pub const NULL_TAG_VALUE: &str = "null";
