//! Metric sample model.
//!
//! An `ExportedMetric` is one named metric from an export, carrying one
//! `MetricSample` per data point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of a metric data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// A sum of integer values.
    LongSum,
    /// A sum of floating point values.
    DoubleSum,
    /// The last observed integer value.
    LongGauge,
    /// The last observed floating point value.
    DoubleGauge,
    /// An explicit-bucket histogram.
    Histogram,
    /// An exponential-bucket histogram.
    ExponentialHistogram,
    /// A quantile summary.
    Summary,
    /// A data point without a recognized value payload.
    Other,
}

impl MetricType {
    /// Returns `true` for distribution types that carry no single scalar.
    #[must_use]
    pub fn is_distribution(self) -> bool {
        matches!(
            self,
            Self::Histogram | Self::ExponentialHistogram | Self::Summary
        )
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongSum => write!(f, "long_sum"),
            Self::DoubleSum => write!(f, "double_sum"),
            Self::LongGauge => write!(f, "long_gauge"),
            Self::DoubleGauge => write!(f, "double_gauge"),
            Self::Histogram => write!(f, "histogram"),
            Self::ExponentialHistogram => write!(f, "exponential_histogram"),
            Self::Summary => write!(f, "summary"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Aggregate of a distribution data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DistributionSummary {
    /// Number of observations.
    pub count: u64,
    /// Sum of observations, when recorded.
    pub sum: Option<f64>,
    /// Smallest observation, when recorded.
    pub min: Option<f64>,
    /// Largest observation, when recorded.
    pub max: Option<f64>,
}

/// Value payload of a metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    /// An integer value.
    Long(i64),
    /// A floating point value.
    Double(f64),
    /// Aggregates of a histogram or summary.
    Distribution(DistributionSummary),
    /// No value was recorded.
    Missing,
}

impl SampleValue {
    /// Returns the scalar value, if the payload is a scalar.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Long(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::Distribution(_) | Self::Missing => None,
        }
    }
}

/// A single metric data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// The type of the data point.
    pub metric_type: MetricType,

    /// The recorded value.
    pub value: SampleValue,

    /// End of the collection interval.
    pub end_time: DateTime<Utc>,

    /// Data point attributes, stringified. `None` marks an attribute without a value.
    #[serde(default)]
    pub tags: BTreeMap<String, Option<String>>,
}

impl MetricSample {
    /// Creates a new sample without tags.
    #[must_use]
    pub fn new(metric_type: MetricType, value: SampleValue, end_time: DateTime<Utc>) -> Self {
        Self {
            metric_type,
            value,
            end_time,
            tags: BTreeMap::new(),
        }
    }

    /// Adds a tag to the sample.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), Some(value.into()));
        self
    }
}

/// A named metric with its data points.
///
/// # Example
///
/// ```
/// use shared::models::{ExportedMetric, MetricSample, MetricType, SampleValue};
/// use chrono::Utc;
///
/// let metric = ExportedMetric::new("http_requests_total")
///     .with_sample(MetricSample::new(MetricType::LongSum, SampleValue::Long(42), Utc::now()));
///
/// assert_eq!(metric.samples.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMetric {
    /// The metric name.
    pub name: String,

    /// One sample per data point.
    #[serde(default)]
    pub samples: Vec<MetricSample>,
}

impl ExportedMetric {
    /// Creates a metric without samples.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    /// Appends a sample.
    #[must_use]
    pub fn with_sample(mut self, sample: MetricSample) -> Self {
        self.samples.push(sample);
        self
    }
}
