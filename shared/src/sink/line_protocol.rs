//! InfluxDB line protocol encoding.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`
//!
//! Timestamps are written in milliseconds; the write request must use
//! `precision=ms`.

use super::SinkError;
use crate::models::{FieldValue, Point};
use std::fmt::Write as _;

fn escape_measurement(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            ',' | ' ' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

/// Escapes tag keys, tag values and field keys.
///
/// Every backslash is doubled so a trailing one cannot escape the delimiter
/// that follows.
fn escape_key(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            ',' | '=' | ' ' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

fn escape_string_field(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Encodes a point as a single line-protocol line (without trailing newline).
///
/// Tags with an empty value are omitted, since the store rejects them.
///
/// # Errors
///
/// Returns `SinkError::InvalidPoint` if the point has no fields or a float
/// field is not finite.
pub fn encode(point: &Point) -> Result<String, SinkError> {
    if point.fields().is_empty() {
        return Err(SinkError::InvalidPoint(format!(
            "point '{}' has no fields",
            point.measurement()
        )));
    }

    let mut line = String::with_capacity(128);
    escape_measurement(&mut line, point.measurement());

    for (key, value) in point.tags() {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        line.push(',');
        escape_key(&mut line, key);
        line.push('=');
        escape_key(&mut line, value);
    }

    line.push(' ');
    for (i, (key, value)) in point.fields().iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        escape_key(&mut line, key);
        line.push('=');
        match value {
            FieldValue::Float(v) => {
                if !v.is_finite() {
                    return Err(SinkError::InvalidPoint(format!(
                        "field '{key}' of '{}' is not a finite number",
                        point.measurement()
                    )));
                }
                let _ = write!(line, "{v}");
            }
            FieldValue::Integer(v) => {
                let _ = write!(line, "{v}i");
            }
            FieldValue::String(v) => escape_string_field(&mut line, v),
        }
    }

    let _ = write!(line, " {}", point.timestamp_millis());
    Ok(line)
}
