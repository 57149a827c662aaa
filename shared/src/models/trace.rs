//! Span record model.
//!
//! A `SpanRecord` carries the parts of a completed span that are turned into a
//! `traces` point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status code for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SpanStatus {
    /// No status was set by the instrumentation.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "Unset"),
            Self::Ok => write!(f, "Ok"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A completed span.
///
/// # Example
///
/// ```
/// use shared::models::{SpanRecord, SpanStatus};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let span = SpanRecord::new("GET /users", SpanStatus::Ok, Utc::now(), Duration::from_micros(12_340));
/// assert!((span.duration_ms() - 12.34).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Operation (span) name.
    pub operation_name: String,

    /// Final status of the span.
    #[serde(default)]
    pub status: SpanStatus,

    /// When the span started.
    pub start_time: DateTime<Utc>,

    /// How long the span took.
    pub duration: Duration,
}

impl SpanRecord {
    /// Creates a new span record.
    #[must_use]
    pub fn new(
        operation_name: impl Into<String>,
        status: SpanStatus,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            status,
            start_time,
            duration,
        }
    }

    /// Returns the duration in fractional milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_nanos() as f64 / 1_000_000.0
    }
}
