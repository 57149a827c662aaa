//! HTTP route definitions.

mod health;
mod otlp;

pub use health::health_routes;
pub use otlp::{otlp_routes, OtlpError};
