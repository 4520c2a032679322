//! Bottle Store Port - Bottle and Reply Persistence Interface
//!
//! Defines the query surface the exchange needs over the `bottles` and
//! `bottle_replies` collections. Draws go through `record_pick`, a
//! conditional update, so concurrent catches can never lose an increment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::bottle::{Bottle, BottleId, BottleReply, NewBottle, NewReply, UserId};

/// Trait for bottle persistence providers.
#[async_trait]
pub trait BottleStore: Send + Sync + 'static {
  /// Insert a new floating bottle and return the stored row.
  async fn insert_bottle(&self, bottle: NewBottle) -> anyhow::Result<Bottle>;

  /// Fetch a single bottle by id.
  async fn find_bottle(&self, id: &BottleId) -> anyhow::Result<Option<Bottle>>;

  /// All bottles `catcher` may draw: floating, thrown by someone else,
  /// with draws left. No ordering guarantee.
  async fn find_eligible(&self, catcher: &UserId) -> anyhow::Result<Vec<Bottle>>;

  /// Atomically apply one draw.
  ///
  /// Succeeds only if the bottle is still floating with
  /// `pick_count == expected_pick_count`. On success `pick_count` is
  /// incremented and, if it reached `max_picks`, the bottle is returned
  /// with `returned_at = now` in the same write.
  ///
  /// Returns `None` when the precondition no longer holds (lost race).
  async fn record_pick(
    &self,
    id: &BottleId,
    expected_pick_count: u32,
    now: DateTime<Utc>,
  ) -> anyhow::Result<Option<Bottle>>;

  /// Bottles created by `creator` at or after `since`, newest first.
  async fn list_by_creator_since(
    &self,
    creator: &UserId,
    since: DateTime<Utc>,
  ) -> anyhow::Result<Vec<Bottle>>;

  /// Number of bottles currently floating.
  async fn count_floating(&self) -> anyhow::Result<u64>;
}

/// Trait for reply persistence providers.
#[async_trait]
pub trait ReplyStore: Send + Sync + 'static {
  /// Append a reply to a bottle's thread.
  async fn insert_reply(&self, reply: NewReply) -> anyhow::Result<BottleReply>;

  /// All replies of a bottle, oldest first.
  async fn replies_for(&self, bottle_id: &BottleId) -> anyhow::Result<Vec<BottleReply>>;
}
