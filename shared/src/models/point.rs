//! Time-series point model.
//!
//! A `Point` is the normalized unit every signal is converted into before it is
//! written to the store: a measurement, indexed string tags, value fields and a
//! millisecond-precision timestamp.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use validator::Validate;

/// The value of a single point field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A floating point value.
    Float(f64),
    /// A signed integer value.
    Integer(i64),
    /// A string value.
    String(String),
}

impl FieldValue {
    /// Returns the numeric value as `f64`, if this field is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::String(_) => None,
        }
    }

    /// Returns the string value, if this field is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Float(_) | Self::Integer(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// A time-series point.
///
/// Tags and fields are kept in sorted maps, so iteration order is stable and
/// matches the order the store prefers on the wire.
///
/// # Example
///
/// ```
/// use shared::models::Point;
/// use chrono::Utc;
///
/// let point = Point::new("traces", Utc::now())
///     .with_tag("operation", "GET /users")
///     .with_field("duration_ms", 12.5);
///
/// assert!(point.validate_point().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Point {
    /// Measurement the point belongs to.
    #[validate(length(min = 1, message = "Measurement cannot be empty"))]
    measurement: String,

    /// Indexed string dimensions.
    #[serde(default)]
    tags: BTreeMap<String, String>,

    /// Value columns.
    fields: BTreeMap<String, FieldValue>,

    /// Point time, truncated to milliseconds.
    timestamp: DateTime<Utc>,
}

/// Errors that can occur during point validation.
#[derive(Debug, Error)]
pub enum PointValidationError {
    /// The measurement name is empty.
    #[error("Point measurement cannot be empty")]
    EmptyMeasurement,

    /// The point carries no field.
    #[error("Point '{0}' has no fields")]
    NoFields(String),
}

/// Truncates a timestamp to millisecond precision.
#[must_use]
pub fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = timestamp.nanosecond();
    timestamp
        .with_nanosecond(nanos - nanos % 1_000_000)
        .unwrap_or(timestamp)
}

impl Point {
    /// Creates a point without tags or fields.
    ///
    /// The timestamp is truncated to millisecond precision.
    #[must_use]
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: truncate_to_millis(timestamp),
        }
    }

    /// Adds a tag, replacing any previous value for the same key.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field, replacing any previous value for the same key.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if a tag with the given key is present.
    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Returns the measurement name.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Returns the tag set.
    #[must_use]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Returns a single tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the field set.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns a single field value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns the point timestamp.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the point timestamp as milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Validates the point invariants: non-empty measurement and at least one field.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first violated invariant.
    pub fn validate_point(&self) -> Result<(), PointValidationError> {
        if self.validate().is_err() {
            return Err(PointValidationError::EmptyMeasurement);
        }
        if self.fields.is_empty() {
            return Err(PointValidationError::NoFields(self.measurement.clone()));
        }
        Ok(())
    }
}
