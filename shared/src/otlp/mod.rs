//! OpenTelemetry Protocol (OTLP) support.
//!
//! This module re-exports the generated OTLP protobuf types and provides the
//! conversion from OTLP messages into the bridge's signal records.
//!
//! # Example
//!
//! ```
//! use shared::otlp::conversions::otlp_span_to_record;
//! use shared::otlp::proto;
//!
//! let span = proto::trace::v1::Span {
//!     name: "GET /users".to_string(),
//!     ..Default::default()
//! };
//! let record = otlp_span_to_record(&span);
//! assert_eq!(record.operation_name, "GET /users");
//! ```

pub mod conversions;

/// Generated protobuf types from the OTLP definitions.
pub use opentelemetry_proto::tonic as proto;
