//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `BottleStore` / `ReplyStore`: bottles and reply threads
//! - `QuotaStore`: daily throw/catch counters
//! - `ProfileDirectory` / `ConversationDirectory`: collaborators
//! - `Notifier`: outbound notifications
//! - `ExchangeTelemetry`: activity counters
//! - `Clock`: time source

pub mod bottle_store;
pub mod clock;
pub mod directory;
pub mod notifier;
pub mod quota_store;
pub mod telemetry;

pub use bottle_store::{BottleStore, ReplyStore};
pub use clock::{Clock, SystemClock};
pub use directory::{ConversationDirectory, ProfileDirectory};
pub use notifier::{NoopNotifier, Notifier};
pub use quota_store::QuotaStore;
pub use telemetry::{ExchangeTelemetry, NoopTelemetry};
