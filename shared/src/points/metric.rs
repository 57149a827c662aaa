use super::{PointBuilder, NULL_TAG_VALUE};
use crate::models::{ExportedMetric, MetricSample, MetricType, Point, SampleValue};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to emit for histogram, exponential histogram and summary samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedMetricPolicy {
    /// Emit `count` and `sum` fields, plus `min` and `max` when recorded.
    #[default]
    Decompose,
    /// Emit `value = 0`.
    Zero,
    /// Emit no point.
    Drop,
}

impl FromStr for UnsupportedMetricPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decompose" => Ok(Self::Decompose),
            "zero" => Ok(Self::Zero),
            "drop" => Ok(Self::Drop),
            other => Err(format!(
                "unknown policy '{other}', expected one of: decompose, zero, drop"
            )),
        }
    }
}

/// Builds one point per metric sample, measured under the metric name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricPointBuilder {
    policy: UnsupportedMetricPolicy,
}

impl MetricPointBuilder {
    /// Creates a builder with the given policy for distribution samples.
    #[must_use]
    pub fn new(policy: UnsupportedMetricPolicy) -> Self {
        Self { policy }
    }

    /// Returns the configured distribution policy.
    #[must_use]
    pub fn policy(&self) -> UnsupportedMetricPolicy {
        self.policy
    }

    fn build_sample(&self, name: &str, sample: &MetricSample) -> Option<Point> {
        let mut point = Point::new(name, sample.end_time);
        for (key, value) in &sample.tags {
            point = point.with_tag(key.as_str(), value.as_deref().unwrap_or(NULL_TAG_VALUE));
        }

        let point = match (sample.metric_type, &sample.value) {
            (MetricType::Histogram | MetricType::ExponentialHistogram | MetricType::Summary, value) => {
                match self.policy {
                    UnsupportedMetricPolicy::Drop => return None,
                    UnsupportedMetricPolicy::Zero => point.with_field("value", 0.0),
                    UnsupportedMetricPolicy::Decompose => match value {
                        SampleValue::Distribution(summary) => {
                            let mut point = point
                                .with_field("count", i64::try_from(summary.count).unwrap_or(i64::MAX))
                                .with_field("sum", summary.sum.unwrap_or(0.0));
                            if let Some(min) = summary.min {
                                point = point.with_field("min", min);
                            }
                            if let Some(max) = summary.max {
                                point = point.with_field("max", max);
                            }
                            point
                        }
                        _ => point.with_field("value", 0.0),
                    },
                }
            }
            (MetricType::LongSum | MetricType::LongGauge, value) => match value {
                SampleValue::Long(v) => point.with_field("value", *v),
                SampleValue::Double(v) => point.with_field("value", *v),
                _ => point.with_field("value", 0_i64),
            },
            (MetricType::DoubleSum | MetricType::DoubleGauge, value) => {
                point.with_field("value", value.as_f64().unwrap_or(0.0))
            }
            (MetricType::Other, _) => point.with_field("value", 0.0),
        };

        Some(point)
    }
}

impl PointBuilder for MetricPointBuilder {
    type Record = ExportedMetric;

    fn build(&self, metric: &ExportedMetric) -> Vec<Point> {
        if metric.name.is_empty() {
            tracing::warn!(
                samples = metric.samples.len(),
                "Skipping metric without a name"
            );
            return Vec::new();
        }

        metric
            .samples
            .iter()
            .filter_map(|sample| self.build_sample(&metric.name, sample))
            .collect()
    }
}
