//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bottle workflows.
//!
//! Use cases:
//! - `BottleExchange`: throw, catch, reply, greet, list, detail, usage
//! - `BottleSession`: per-user cache and interaction state

pub mod bottle_exchange;
pub mod session;

pub use bottle_exchange::{
  BottleDetail, BottleExchange, CatchResolution, CaughtBottle, ExchangePorts, Greeting, ReplyView,
};
pub use session::BottleSession;
