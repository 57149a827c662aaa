//! Server configuration module.
//!
//! Configuration is read once from environment variables (a `.env` file is
//! loaded first by the binary) and is immutable afterwards.
//!
//! Required:
//! - `OTELFLUX_INFLUX_URL`: Store base URL
//! - `OTELFLUX_INFLUX_TOKEN`: Store API token
//! - `OTELFLUX_INFLUX_BUCKET`: Target bucket
//! - `OTELFLUX_INFLUX_ORG`: Target organization
//! - `OTELFLUX_AUTH_TOKEN`: Token clients must present as `Bearer <token>`
//!
//! Optional (default):
//! - `OTELFLUX_HOST` (`0.0.0.0`), `OTELFLUX_GRPC_PORT` (4317), `OTELFLUX_HTTP_PORT` (4318)
//! - `OTELFLUX_WRITE_WORKERS` (4), `OTELFLUX_QUEUE_CAPACITY` (10000)
//! - `OTELFLUX_WRITE_RETRIES` (3), `OTELFLUX_RETRY_BASE_DELAY_MS` (100),
//!   `OTELFLUX_RETRY_MAX_DELAY_MS` (2000)
//! - `OTELFLUX_WRITE_TIMEOUT_MS` (5000), `OTELFLUX_SHUTDOWN_GRACE_MS` (10000)
//! - `OTELFLUX_MAX_BODY_BYTES` (4194304)
//! - `OTELFLUX_UNSUPPORTED_METRICS` (`decompose`, or `zero` / `drop`)
//! - `OTELFLUX_SINK` (`influx`, or `memory`)
//! - `OTELFLUX_LOG_FORMAT` (`text`, or `json`)

use shared::dispatch::DispatchConfig;
use shared::points::UnsupportedMetricPolicy;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set or empty.
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The store settings failed validation.
    #[error("Invalid store settings: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Store and client credentials.
#[derive(Clone, PartialEq, Eq, Validate)]
pub struct Settings {
    /// Store base URL.
    #[validate(length(min = 1))]
    pub url: String,
    /// Store API token.
    #[validate(length(min = 1))]
    pub token: String,
    /// Target bucket.
    #[validate(length(min = 1))]
    pub bucket: String,
    /// Target organization.
    #[validate(length(min = 1))]
    pub organization: String,
    /// Token clients must present.
    #[validate(length(min = 1))]
    pub expected_token: String,
}

impl Settings {
    /// Creates store settings.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        bucket: impl Into<String>,
        organization: impl Into<String>,
        expected_token: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            bucket: bucket.into(),
            organization: organization.into(),
            expected_token: expected_token.into(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("bucket", &self.bucket)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

/// Where points are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// InfluxDB v2 write API.
    #[default]
    Influx,
    /// Recorded in memory, never persisted.
    Memory,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "influx" | "influxdb" => Ok(Self::Influx),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown sink '{other}', expected influx or memory")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected text or json")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The address both listeners bind to.
    pub host: IpAddr,
    /// OTLP/gRPC port.
    pub grpc_port: u16,
    /// OTLP/HTTP port.
    pub http_port: u16,
    /// Store and client credentials.
    pub settings: Settings,
    /// Write queue and worker pool tuning.
    pub dispatch: DispatchConfig,
    /// Per-request timeout for store writes.
    pub write_timeout: Duration,
    /// Maximum accepted OTLP/HTTP request body.
    pub max_body_bytes: usize,
    /// Handling of histogram and summary metrics.
    pub metric_policy: UnsupportedMetricPolicy,
    /// Point destination.
    pub sink: SinkKind,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Creates a configuration with default server options.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            grpc_port: 4317,
            http_port: 4318,
            settings,
            dispatch: DispatchConfig::default(),
            write_timeout: Duration::from_secs(5),
            max_body_bytes: 4 * 1024 * 1024,
            metric_policy: UnsupportedMetricPolicy::default(),
            sink: SinkKind::default(),
            log_format: LogFormat::default(),
        }
    }

    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let settings = Settings::new(
            required("OTELFLUX_INFLUX_URL")?,
            required("OTELFLUX_INFLUX_TOKEN")?,
            required("OTELFLUX_INFLUX_BUCKET")?,
            required("OTELFLUX_INFLUX_ORG")?,
            required("OTELFLUX_AUTH_TOKEN")?,
        );
        settings.validate()?;

        let defaults = Self::new(settings);
        let dispatch_defaults = DispatchConfig::default();

        Ok(Self {
            host: optional(&lookup, "OTELFLUX_HOST")?.unwrap_or(defaults.host),
            grpc_port: optional(&lookup, "OTELFLUX_GRPC_PORT")?.unwrap_or(defaults.grpc_port),
            http_port: optional(&lookup, "OTELFLUX_HTTP_PORT")?.unwrap_or(defaults.http_port),
            dispatch: DispatchConfig {
                workers: positive(&lookup, "OTELFLUX_WRITE_WORKERS")?
                    .unwrap_or(dispatch_defaults.workers),
                queue_capacity: positive(&lookup, "OTELFLUX_QUEUE_CAPACITY")?
                    .unwrap_or(dispatch_defaults.queue_capacity),
                max_retries: optional(&lookup, "OTELFLUX_WRITE_RETRIES")?
                    .unwrap_or(dispatch_defaults.max_retries),
                retry_base_delay: millis(&lookup, "OTELFLUX_RETRY_BASE_DELAY_MS")?
                    .unwrap_or(dispatch_defaults.retry_base_delay),
                retry_max_delay: millis(&lookup, "OTELFLUX_RETRY_MAX_DELAY_MS")?
                    .unwrap_or(dispatch_defaults.retry_max_delay),
                shutdown_grace: millis(&lookup, "OTELFLUX_SHUTDOWN_GRACE_MS")?
                    .unwrap_or(dispatch_defaults.shutdown_grace),
            },
            write_timeout: millis(&lookup, "OTELFLUX_WRITE_TIMEOUT_MS")?
                .unwrap_or(defaults.write_timeout),
            max_body_bytes: positive(&lookup, "OTELFLUX_MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
            metric_policy: optional(&lookup, "OTELFLUX_UNSUPPORTED_METRICS")?
                .unwrap_or(defaults.metric_policy),
            sink: optional(&lookup, "OTELFLUX_SINK")?.unwrap_or(defaults.sink),
            log_format: optional(&lookup, "OTELFLUX_LOG_FORMAT")?.unwrap_or(defaults.log_format),
            settings: defaults.settings,
        })
    }

    /// Returns the OTLP/gRPC socket address.
    #[must_use]
    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.grpc_port)
    }

    /// Returns the OTLP/HTTP socket address.
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.http_port)
    }
}

fn optional<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            name,
            value: value.clone(),
            reason: e.to_string(),
        })
}

fn positive<F>(lookup: &F, name: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional::<F, usize>(lookup, name)? {
        Some(0) => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}

fn millis<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(optional::<F, u64>(lookup, name)?.map(Duration::from_millis))
}
