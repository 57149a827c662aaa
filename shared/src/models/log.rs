//! Log entry model.
//!
//! Defines the `LogEntry` structure handed to the log point builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Log severity derived from an OTLP severity number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// No severity was given.
    Unspecified,
    /// Detailed debug information.
    Trace,
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
    /// Critical/fatal conditions.
    Fatal,
}

impl Severity {
    /// Maps an OTLP severity number to a severity.
    #[must_use]
    pub fn from_number(number: i32) -> Self {
        // https://opentelemetry.io/docs/specs/otel/logs/data-model/#field-severitynumber
        match number {
            1..=4 => Self::Trace,
            5..=8 => Self::Debug,
            9..=12 => Self::Info,
            13..=16 => Self::Warn,
            17..=20 => Self::Error,
            21..=24 => Self::Fatal,
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "UNSPECIFIED"),
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// A log record emitted by an instrumented application.
///
/// # Example
///
/// ```
/// use shared::models::LogEntry;
/// use chrono::Utc;
///
/// let log = LogEntry::new("Information", Utc::now())
///     .with_category("MyApp.Controllers.UserController")
///     .with_formatted_message("User 42 logged in")
///     .with_attribute("user_id", "42");
///
/// assert_eq!(log.message(), "User 42 logged in");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity as text.
    pub severity: String,

    /// Logger category, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// The rendered log message, if the producer supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,

    /// The structured body, used when no formatted message exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// When the log event occurred.
    pub timestamp: DateTime<Utc>,

    /// Additional attributes, stringified. `None` marks an attribute without a value.
    #[serde(default)]
    pub attributes: BTreeMap<String, Option<String>>,
}

impl LogEntry {
    /// Creates a log entry with no message, body, category or attributes.
    #[must_use]
    pub fn new(severity: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            severity: severity.into(),
            category: None,
            formatted_message: None,
            body: None,
            timestamp,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the formatted message.
    #[must_use]
    pub fn with_formatted_message(mut self, message: impl Into<String>) -> Self {
        self.formatted_message = Some(message.into());
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds an attribute with a value.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), Some(value.into()));
        self
    }

    /// Adds an attribute that has no value.
    #[must_use]
    pub fn with_empty_attribute(mut self, key: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), None);
        self
    }

    /// Returns the message text: the formatted message if present, otherwise
    /// the stringified body, otherwise an empty string.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(message) = &self.formatted_message {
            return message.clone();
        }
        match &self.body {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}
