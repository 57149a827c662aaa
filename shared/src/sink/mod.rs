//! Write sinks.
//!
//! The `WriteSink` trait abstracts "write one point to the store". The
//! `InfluxSink` talks to an InfluxDB v2 write API; the `InMemorySink` records
//! writes for development and testing.

pub mod influx;
pub mod line_protocol;
pub mod memory;

pub use influx::InfluxSink;
pub use memory::{InMemorySink, RecordedWrite};

use crate::models::Point;
use async_trait::async_trait;
use thiserror::Error;

/// Bucket and organization a point is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    /// Target bucket.
    pub bucket: String,
    /// Target organization.
    pub organization: String,
}

impl WriteTarget {
    /// Creates a write target.
    #[must_use]
    pub fn new(bucket: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            organization: organization.into(),
        }
    }
}

/// Errors that can occur while writing a point.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request to the store failed (connection refused, timeout, ...).
    #[error("Request to store failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with an error status.
    #[error("Store rejected write with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the store.
        body: String,
    },

    /// The point cannot be encoded for the store.
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// The sink is unavailable for another reason.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl SinkError {
    /// Returns `true` if retrying the same write may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidPoint(_) => false,
        }
    }
}

/// Trait for point write implementations.
///
/// Implementations must be safe for concurrent use: the dispatcher calls
/// `write` from several writer tasks at once.
#[async_trait]
pub trait WriteSink: Send + Sync {
    /// Writes a single point to the given bucket and organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or rejects the point.
    async fn write(&self, point: &Point, target: &WriteTarget) -> Result<(), SinkError>;
}
