//! Conversions from OTLP protobuf types into signal records.
//!
//! This module turns OpenTelemetry Protocol (OTLP) spans, metrics and log
//! records into the `SpanRecord`, `ExportedMetric` and `LogEntry` records the
//! point builders consume.

use crate::models::{
    DistributionSummary, ExportedMetric, LogEntry, MetricSample, MetricType, SampleValue,
    Severity, SpanRecord, SpanStatus,
};
use crate::otlp::proto;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::{Duration, UNIX_EPOCH};

/// Converts an OTLP timestamp (nanoseconds since epoch) to a `DateTime<Utc>`.
fn timestamp_to_datetime(nanos: u64) -> DateTime<Utc> {
    let duration = Duration::from_nanos(nanos);
    DateTime::<Utc>::from(UNIX_EPOCH + duration)
}

/// Converts OTLP `AnyValue` to `serde_json::Value`.
fn any_value_to_json(value: &proto::common::v1::AnyValue) -> serde_json::Value {
    use proto::common::v1::any_value::Value;

    match &value.value {
        Some(Value::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Value::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Value::IntValue(i)) => serde_json::Value::Number((*i).into()),
        Some(Value::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Value::ArrayValue(arr)) => {
            serde_json::Value::Array(arr.values.iter().map(any_value_to_json).collect())
        }
        Some(Value::KvlistValue(kv)) => {
            let mut map = serde_json::Map::new();
            for pair in &kv.values {
                let value = pair
                    .value
                    .as_ref()
                    .map_or(serde_json::Value::Null, any_value_to_json);
                map.insert(pair.key.clone(), value);
            }
            serde_json::Value::Object(map)
        }
        Some(Value::BytesValue(b)) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        None => serde_json::Value::Null,
    }
}

/// Renders an OTLP `AnyValue` as tag text.
///
/// Returns `None` when the value carries no payload.
#[must_use]
pub fn any_value_to_string(value: &proto::common::v1::AnyValue) -> Option<String> {
    use proto::common::v1::any_value::Value;

    match &value.value {
        Some(Value::StringValue(s)) => Some(s.clone()),
        Some(Value::BoolValue(b)) => Some(b.to_string()),
        Some(Value::IntValue(i)) => Some(i.to_string()),
        Some(Value::DoubleValue(d)) => Some(d.to_string()),
        Some(Value::BytesValue(b)) => {
            use base64::Engine;
            Some(base64::engine::general_purpose::STANDARD.encode(b))
        }
        Some(Value::ArrayValue(_) | Value::KvlistValue(_)) => {
            Some(any_value_to_json(value).to_string())
        }
        None => None,
    }
}

/// Converts OTLP key-value pairs to a string map, keeping keys whose value is absent.
fn key_values_to_string_map(
    attributes: &[proto::common::v1::KeyValue],
) -> BTreeMap<String, Option<String>> {
    attributes
        .iter()
        .map(|kv| {
            (
                kv.key.clone(),
                kv.value.as_ref().and_then(any_value_to_string),
            )
        })
        .collect()
}

/// Converts an OTLP span status to `SpanStatus`.
fn otlp_span_status_to_status(status: Option<&proto::trace::v1::Status>) -> SpanStatus {
    use proto::trace::v1::status::StatusCode;

    match status.map(|s| StatusCode::try_from(s.code)) {
        Some(Ok(StatusCode::Ok)) => SpanStatus::Ok,
        Some(Ok(StatusCode::Error)) => SpanStatus::Error,
        Some(Ok(StatusCode::Unset) | Err(_)) | None => SpanStatus::Unset,
    }
}

/// Converts an OTLP `Span` to a `SpanRecord`.
///
/// The duration saturates at zero when the end time precedes the start time.
#[must_use]
pub fn otlp_span_to_record(otlp_span: &proto::trace::v1::Span) -> SpanRecord {
    let duration = Duration::from_nanos(
        otlp_span
            .end_time_unix_nano
            .saturating_sub(otlp_span.start_time_unix_nano),
    );

    SpanRecord {
        operation_name: otlp_span.name.clone(),
        status: otlp_span_status_to_status(otlp_span.status.as_ref()),
        start_time: timestamp_to_datetime(otlp_span.start_time_unix_nano),
        duration,
    }
}

/// Converts an OTLP number data point to a `MetricSample`.
fn number_data_point_to_sample(
    data_point: &proto::metrics::v1::NumberDataPoint,
    long_type: MetricType,
    double_type: MetricType,
) -> MetricSample {
    use proto::metrics::v1::number_data_point::Value;

    let (metric_type, value) = match data_point.value {
        Some(Value::AsInt(i)) => (long_type, SampleValue::Long(i)),
        Some(Value::AsDouble(d)) => (double_type, SampleValue::Double(d)),
        None => (MetricType::Other, SampleValue::Missing),
    };

    MetricSample {
        metric_type,
        value,
        end_time: timestamp_to_datetime(data_point.time_unix_nano),
        tags: key_values_to_string_map(&data_point.attributes),
    }
}

/// Builds a distribution sample from the aggregates common to histograms and summaries.
fn distribution_sample(
    metric_type: MetricType,
    summary: DistributionSummary,
    time_unix_nano: u64,
    attributes: &[proto::common::v1::KeyValue],
) -> MetricSample {
    MetricSample {
        metric_type,
        value: SampleValue::Distribution(summary),
        end_time: timestamp_to_datetime(time_unix_nano),
        tags: key_values_to_string_map(attributes),
    }
}

/// Converts an OTLP `Metric` to an `ExportedMetric` with one sample per data point.
#[must_use]
pub fn otlp_metric_to_exported(otlp_metric: &proto::metrics::v1::Metric) -> ExportedMetric {
    use proto::metrics::v1::metric::Data;

    let samples = match &otlp_metric.data {
        Some(Data::Gauge(gauge)) => gauge
            .data_points
            .iter()
            .map(|dp| number_data_point_to_sample(dp, MetricType::LongGauge, MetricType::DoubleGauge))
            .collect(),
        Some(Data::Sum(sum)) => sum
            .data_points
            .iter()
            .map(|dp| number_data_point_to_sample(dp, MetricType::LongSum, MetricType::DoubleSum))
            .collect(),
        Some(Data::Histogram(histogram)) => histogram
            .data_points
            .iter()
            .map(|dp| {
                distribution_sample(
                    MetricType::Histogram,
                    DistributionSummary {
                        count: dp.count,
                        sum: dp.sum,
                        min: dp.min,
                        max: dp.max,
                    },
                    dp.time_unix_nano,
                    &dp.attributes,
                )
            })
            .collect(),
        Some(Data::ExponentialHistogram(histogram)) => histogram
            .data_points
            .iter()
            .map(|dp| {
                distribution_sample(
                    MetricType::ExponentialHistogram,
                    DistributionSummary {
                        count: dp.count,
                        sum: dp.sum,
                        min: dp.min,
                        max: dp.max,
                    },
                    dp.time_unix_nano,
                    &dp.attributes,
                )
            })
            .collect(),
        Some(Data::Summary(summary)) => summary
            .data_points
            .iter()
            .map(|dp| {
                distribution_sample(
                    MetricType::Summary,
                    DistributionSummary {
                        count: dp.count,
                        sum: Some(dp.sum),
                        min: None,
                        max: None,
                    },
                    dp.time_unix_nano,
                    &dp.attributes,
                )
            })
            .collect(),
        None => Vec::new(),
    };

    ExportedMetric {
        name: otlp_metric.name.clone(),
        samples,
    }
}

/// Converts an OTLP `LogRecord` to a `LogEntry`.
///
/// # Arguments
///
/// * `log_record` - The OTLP log record
/// * `scope_name` - The instrumentation scope name, used as the log category
///
/// A string body is taken as the formatted message; any other body is kept as
/// the raw body. The timestamp falls back to the observed time, then to now.
#[must_use]
pub fn otlp_log_to_entry(log_record: &proto::logs::v1::LogRecord, scope_name: &str) -> LogEntry {
    use proto::common::v1::any_value::Value;

    let timestamp = if log_record.time_unix_nano > 0 {
        timestamp_to_datetime(log_record.time_unix_nano)
    } else if log_record.observed_time_unix_nano > 0 {
        timestamp_to_datetime(log_record.observed_time_unix_nano)
    } else {
        Utc::now()
    };

    let severity = if log_record.severity_text.is_empty() {
        Severity::from_number(log_record.severity_number).to_string()
    } else {
        log_record.severity_text.clone()
    };

    let (formatted_message, body) = match log_record.body.as_ref() {
        Some(proto::common::v1::AnyValue {
            value: Some(Value::StringValue(s)),
        }) => (Some(s.clone()), None),
        Some(body @ proto::common::v1::AnyValue { value: Some(_) }) => {
            (None, Some(any_value_to_json(body)))
        }
        Some(_) | None => (None, None),
    };

    LogEntry {
        severity,
        category: (!scope_name.is_empty()).then(|| scope_name.to_string()),
        formatted_message,
        body,
        timestamp,
        attributes: key_values_to_string_map(&log_record.attributes),
    }
}


#[cfg(test)]
#[path = "conversions_test.rs"]
mod conversions_test;
