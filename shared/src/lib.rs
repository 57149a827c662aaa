//! otelflux shared library
//!
//! Everything between a decoded OTLP export and the time-series store: signal
//! records, point building, the bearer-token gate, write sinks and the
//! bounded write dispatcher.
//!
//! # Modules
//!
//! - [`models`] - Signal records and the `Point` model
//! - [`otlp`] - OTLP protobuf types and conversions to records
//! - [`points`] - Per-signal point builders
//! - [`auth`] - Bearer-token gate
//! - [`sink`] - Store write sinks and line-protocol encoding
//! - [`dispatch`] - Bounded write queue with a writer pool
//! - [`processor`] - Signal completion hooks
//! - [`pipeline`] - OTLP export request handling
//!
//! # Example
//!
//! ```
//! use shared::models::{SpanRecord, SpanStatus};
//! use shared::points::{PointBuilder, TracePointBuilder};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! let span = SpanRecord::new("GET /users", SpanStatus::Ok, Utc::now(), Duration::from_millis(12));
//! let points = TracePointBuilder.build(&span);
//!
//! assert_eq!(points[0].measurement(), "traces");
//! assert!(points[0].validate_point().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod dispatch;
pub mod models;
pub mod otlp;
pub mod pipeline;
pub mod points;
pub mod processor;
pub mod sink;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
