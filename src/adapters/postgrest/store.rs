//! PostgREST Store - Bottle Ports over HTTP
//!
//! Implements every store and directory port against the hosted tables.
//! Read-modify-write steps use conditional `PATCH` filters
//! (`pick_count=eq.k`, `throws=eq.n`) and treat an empty result as a lost
//! race; find-or-create steps re-read after an insert conflict.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use super::client::{PostgrestClient, RowConflict};
use super::rows::{IdRow, NewConversationRow, PickPatch, ProfileRow};
use crate::domain::bottle::{Bottle, BottleId, BottleReply, NewBottle, NewReply, UserId};
use crate::domain::conversation::{ConversationId, ConversationPair};
use crate::domain::notification::Notification;
use crate::domain::quota::{DailyCounter, QuotaKind};
use crate::ports::{
  BottleStore, ConversationDirectory, Notifier, ProfileDirectory, QuotaStore, ReplyStore,
};

const BOTTLES: &str = "bottles";
const REPLIES: &str = "bottle_replies";
const DAILY_LIMITS: &str = "bottle_daily_limits";
const PROFILES: &str = "profiles";
const CONVERSATIONS: &str = "conversations";
const NOTIFICATIONS: &str = "notifications";

/// Compare-and-swap rounds for a counter increment before giving up.
const COUNTER_CAS_ATTEMPTS: u32 = 5;

fn eq(value: impl std::fmt::Display) -> String {
  format!("eq.{value}")
}

/// `in.(...)` filter with every value double-quoted.
fn in_list(values: &[String]) -> String {
  let quoted: Vec<String> = values
    .iter()
    .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
    .collect();
  format!("in.({})", quoted.join(","))
}

fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Store backed by a PostgREST endpoint.
pub struct PostgrestStore {
  client: PostgrestClient,
}

impl PostgrestStore {
  pub fn new(client: PostgrestClient) -> Self {
    Self { client }
  }

  pub async fn health_check(&self) -> bool {
    self.client.health_check().await
  }

  /// Move one daily counter from its current value to `next(current)`.
  ///
  /// Runs as a compare-and-swap: the `PATCH` only matches while the
  /// column still holds the value `next` was computed from, and an
  /// absent row is created with an insert that may conflict. `next`
  /// returning `None` refuses the change and yields `Ok(None)`.
  async fn adjust_counter(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
    next: impl Fn(u32) -> Option<u32> + Send + Sync,
  ) -> Result<Option<DailyCounter>> {
    for attempt in 1..=COUNTER_CAS_ATTEMPTS {
      match self.get_counter(user_id, date).await? {
        None => {
          let Some(value) = next(0) else {
            return Ok(None);
          };
          let mut fresh = DailyCounter::empty(user_id, date);
          if value == 0 {
            return Ok(Some(fresh));
          }
          match kind {
            QuotaKind::Throw => fresh.throws = value,
            QuotaKind::Catch => fresh.catches = value,
          }
          match self.client.insert::<_, DailyCounter>(DAILY_LIMITS, &fresh).await {
            Ok(created) => return Ok(Some(created)),
            Err(e) if e.is::<RowConflict>() => {
              debug!(attempt, "Counter row created concurrently, re-reading");
            }
            Err(e) => return Err(e.context("Failed to create daily counter")),
          }
        }
        Some(current) => {
          let seen = current.count(kind);
          let Some(value) = next(seen) else {
            return Ok(None);
          };
          if value == seen {
            return Ok(Some(current));
          }

          let mut body = Map::new();
          body.insert(kind.column().to_string(), json!(value));

          let updated: Vec<DailyCounter> = self
            .client
            .update(
              DAILY_LIMITS,
              &[
                ("user_id", eq(user_id)),
                ("date", eq(date)),
                (kind.column(), eq(seen)),
              ],
              &Value::Object(body),
            )
            .await
            .context("Failed to update daily counter")?;

          if let Some(counter) = updated.into_iter().next() {
            return Ok(Some(counter));
          }
          debug!(attempt, seen, "Counter moved underneath us, retrying");
        }
      }
    }

    warn!(attempts = COUNTER_CAS_ATTEMPTS, "Counter update kept losing races");
    anyhow::bail!("daily counter for {user_id} on {date} is contended")
  }

  async fn find_conversation(&self, pair: &ConversationPair) -> Result<Option<ConversationId>> {
    let rows: Vec<IdRow> = self
      .client
      .select(
        CONVERSATIONS,
        &[
          ("select", "id".to_string()),
          ("user_a_id", eq(&pair.user_a)),
          ("user_b_id", eq(&pair.user_b)),
          ("limit", "1".to_string()),
        ],
      )
      .await?;
    Ok(rows.into_iter().next().map(|r| r.id))
  }
}

#[async_trait]
impl BottleStore for PostgrestStore {
  #[instrument(skip(self, bottle), fields(creator = %bottle.creator_id))]
  async fn insert_bottle(&self, bottle: NewBottle) -> Result<Bottle> {
    self
      .client
      .insert(BOTTLES, &bottle)
      .await
      .context("Failed to insert bottle")
  }

  async fn find_bottle(&self, id: &BottleId) -> Result<Option<Bottle>> {
    let rows: Vec<Bottle> = self
      .client
      .select(BOTTLES, &[("id", eq(id)), ("limit", "1".to_string())])
      .await
      .context("Failed to fetch bottle")?;
    Ok(rows.into_iter().next())
  }

  async fn find_eligible(&self, catcher: &UserId) -> Result<Vec<Bottle>> {
    let rows: Vec<Bottle> = self
      .client
      .select(
        BOTTLES,
        &[
          ("status", "eq.floating".to_string()),
          ("creator_id", format!("neq.{catcher}")),
        ],
      )
      .await
      .context("Failed to query floating bottles")?;

    // PostgREST cannot compare two columns; apply pick_count < max_picks here.
    Ok(rows.into_iter().filter(|b| b.is_catchable_by(catcher)).collect())
  }

  #[instrument(skip(self), fields(bottle = %id))]
  async fn record_pick(
    &self,
    id: &BottleId,
    expected_pick_count: u32,
    now: DateTime<Utc>,
  ) -> Result<Option<Bottle>> {
    let Some(current) = self.find_bottle(id).await? else {
      return Ok(None);
    };
    if current.pick_count != expected_pick_count {
      return Ok(None);
    }
    let Some(transition) = current.apply_pick(now) else {
      return Ok(None);
    };

    let updated: Vec<Bottle> = self
      .client
      .update(
        BOTTLES,
        &[
          ("id", eq(id)),
          ("status", "eq.floating".to_string()),
          ("pick_count", eq(expected_pick_count)),
        ],
        &PickPatch::from(&transition.bottle),
      )
      .await
      .context("Failed to record pick")?;

    if updated.is_empty() {
      debug!(expected_pick_count, "Conditional pick matched no row");
    }
    Ok(updated.into_iter().next())
  }

  async fn list_by_creator_since(
    &self,
    creator: &UserId,
    since: DateTime<Utc>,
  ) -> Result<Vec<Bottle>> {
    self
      .client
      .select(
        BOTTLES,
        &[
          ("creator_id", eq(creator)),
          ("created_at", format!("gte.{}", timestamp(since))),
          ("order", "created_at.desc".to_string()),
        ],
      )
      .await
      .context("Failed to list own bottles")
  }

  async fn count_floating(&self) -> Result<u64> {
    self
      .client
      .count(BOTTLES, &[("status", "eq.floating".to_string())])
      .await
  }
}

#[async_trait]
impl ReplyStore for PostgrestStore {
  #[instrument(skip(self, reply), fields(bottle = %reply.bottle_id))]
  async fn insert_reply(&self, reply: NewReply) -> Result<BottleReply> {
    self
      .client
      .insert(REPLIES, &reply)
      .await
      .context("Failed to insert reply")
  }

  async fn replies_for(&self, bottle_id: &BottleId) -> Result<Vec<BottleReply>> {
    self
      .client
      .select(
        REPLIES,
        &[
          ("bottle_id", eq(bottle_id)),
          ("order", "created_at.asc".to_string()),
        ],
      )
      .await
      .context("Failed to load replies")
  }
}

#[async_trait]
impl QuotaStore for PostgrestStore {
  async fn get_counter(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<DailyCounter>> {
    let rows: Vec<DailyCounter> = self
      .client
      .select(
        DAILY_LIMITS,
        &[
          ("user_id", eq(user_id)),
          ("date", eq(date)),
          ("limit", "1".to_string()),
        ],
      )
      .await
      .context("Failed to read daily counter")?;
    Ok(rows.into_iter().next())
  }

  #[instrument(skip(self), fields(user = %user_id, %date, %kind))]
  async fn increment_counter(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
  ) -> Result<DailyCounter> {
    self
      .adjust_counter(user_id, date, kind, |seen| Some(seen + 1))
      .await?
      .context("Unconditional counter increment was refused")
  }

  #[instrument(skip(self), fields(user = %user_id, %date, %kind, limit))]
  async fn try_consume(
    &self,
    user_id: &UserId,
    date: NaiveDate,
    kind: QuotaKind,
    limit: u32,
  ) -> Result<Option<DailyCounter>> {
    self
      .adjust_counter(user_id, date, kind, |seen| (seen < limit).then_some(seen + 1))
      .await
  }

  #[instrument(skip(self), fields(user = %user_id, %date, %kind))]
  async fn release(&self, user_id: &UserId, date: NaiveDate, kind: QuotaKind) -> Result<DailyCounter> {
    self
      .adjust_counter(user_id, date, kind, |seen| Some(seen.saturating_sub(1)))
      .await?
      .context("Counter release was refused")
  }
}

#[async_trait]
impl ProfileDirectory for PostgrestStore {
  async fn display_names(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, String>> {
    if user_ids.is_empty() {
      return Ok(HashMap::new());
    }

    let rows: Vec<ProfileRow> = self
      .client
      .select(
        PROFILES,
        &[
          ("select", "id,nickname".to_string()),
          ("id", in_list(user_ids)),
        ],
      )
      .await
      .context("Failed to fetch profiles")?;

    Ok(rows
      .into_iter()
      .filter_map(|row| row.nickname.map(|name| (row.id, name)))
      .collect())
  }
}

#[async_trait]
impl ConversationDirectory for PostgrestStore {
  #[instrument(skip(self), fields(initiator = %initiator, other = %other))]
  async fn find_or_create_conversation(
    &self,
    initiator: &UserId,
    other: &UserId,
  ) -> Result<ConversationId> {
    let pair = ConversationPair::new(initiator, other);
    if let Some(id) = self.find_conversation(&pair).await? {
      return Ok(id);
    }

    let row = NewConversationRow::stranger(pair.clone(), initiator);
    match self.client.insert::<_, IdRow>(CONVERSATIONS, &row).await {
      Ok(created) => Ok(created.id),
      Err(e) if e.is::<RowConflict>() => {
        debug!("Conversation created concurrently, re-reading");
        self
          .find_conversation(&pair)
          .await?
          .context("Conversation vanished after insert conflict")
      }
      Err(e) => Err(e.context("Failed to create conversation")),
    }
  }
}

#[async_trait]
impl Notifier for PostgrestStore {
  async fn notify(&self, notification: &Notification) -> Result<()> {
    self
      .client
      .insert_minimal(NOTIFICATIONS, notification)
      .await
      .context("Failed to insert notification")
  }
}
