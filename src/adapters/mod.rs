//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! backends. Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `memory`: lock-guarded process-local store with JSON snapshots
//! - `postgrest`: hosted tables over HTTP
//! - `metrics`: Prometheus metrics export and health checks

pub mod memory;
pub mod metrics;
pub mod postgrest;
