//! Clock Port - Wall-clock Source
//!
//! Timestamps (`created_at`, `returned_at`) and day keys come from here
//! so that tests can pin time.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync + 'static {
  fn now(&self) -> DateTime<Utc>;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
