//! In-Memory Adapters - Process-local Sea
//!
//! One lock-guarded store implementing every store and directory port,
//! a manual clock for deterministic runs, and atomic JSON snapshots so
//! a single-node deployment survives restarts.

pub mod clock;
pub mod snapshot;
pub mod store;

pub use clock::ManualClock;
pub use snapshot::SnapshotStore;
pub use store::{InMemoryStore, SeaState};
