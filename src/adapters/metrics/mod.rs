//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export on :9090 and health check
//! endpoints (/live, /ready) via axum 0.7. The registry doubles as the
//! exchange's telemetry sink.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use self::prometheus::MetricsRegistry;
