//! Quota Store Port - Daily Counter Interface
//!
//! Per-user daily throw/catch counters keyed by `(user_id, date)`.
//! Every change is atomic on the store side, and the ceiling check for
//! non-VIP users happens in the same step as the increment; the exchange
//! never does a client-side read-modify-write.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::bottle::UserId;
use crate::domain::quota::{DailyCounter, QuotaKind};

/// Trait for daily limit counter providers.
#[async_trait]
pub trait QuotaStore: Send + Sync + 'static {
  /// Today's counter row, if one was created.
  async fn get_counter(
    &self,
    user_id: &UserId,
    date: NaiveDate,
  ) -> anyhow::Result<Option<DailyCounter>>;

  /// Atomically add one to `kind`, creating the row if absent.
  ///
  /// Unconditional; used to count VIP activity.
  /// Returns the counter after the increment.
  async fn increment_counter(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
  ) -> anyhow::Result<DailyCounter>;

  /// Atomically add one to `kind` only while it is below `limit`.
  ///
  /// Returns the counter after the increment, or `None` when the
  /// ceiling was already reached and nothing changed.
  async fn try_consume(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
    limit: u32,
  ) -> anyhow::Result<Option<DailyCounter>>;

  /// Atomically take one back from `kind`, never going below zero.
  ///
  /// Hands back a consumed unit whose action did not happen.
  async fn release(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
  ) -> anyhow::Result<DailyCounter>;
}
