//! PostgREST Adapter - Hosted Tables over HTTP
//!
//! Sub-modules:
//! - `auth`: API key and bearer headers from the environment
//! - `client`: HTTP client with concurrency/rate limiting and retries
//! - `rows`: row shapes that differ from the domain types
//! - `store`: port implementations

pub mod auth;
pub mod client;
pub mod rows;
pub mod store;

pub use auth::PostgrestAuth;
pub use client::{PostgrestClient, PostgrestClientConfig};
pub use store::PostgrestStore;
