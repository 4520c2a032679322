//! In-Memory Store - Every Store Port Behind One Lock
//!
//! Implements bottle, reply, quota, profile, conversation and
//! notification ports over a single `tokio::sync::RwLock<SeaState>`.
//! Every conditional update (pick, counter increment, conversation
//! find-or-create) runs under the write lock, so it is atomic with
//! respect to every other call on the same store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::bottle::{
    Bottle, BottleId, BottleReply, BottleStatus, NewBottle, NewReply, UserId,
};
use crate::domain::conversation::{
    Conversation, ConversationId, ConversationPair, ConversationStatus,
};
use crate::domain::notification::Notification;
use crate::domain::quota::{DailyCounter, QuotaKind};
use crate::ports::{
    BottleStore, ConversationDirectory, Notifier, ProfileDirectory, QuotaStore, ReplyStore,
};

/// Everything the in-memory backend holds. Serialized as the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeaState {
    pub bottles: HashMap<BottleId, Bottle>,
    /// All replies in insertion order.
    pub replies: Vec<BottleReply>,
    /// Keyed by `"{user_id}/{date}"`.
    pub counters: BTreeMap<String, DailyCounter>,
    /// Nicknames by user id.
    pub profiles: HashMap<UserId, String>,
    pub conversations: Vec<Conversation>,
    pub notifications: Vec<Notification>,
}

fn counter_key(user_id: &str, date: NaiveDate) -> String {
    format!("{user_id}/{date}")
}

/// Process-local backend for tests, demos and single-node runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<SeaState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a restored snapshot.
    pub fn from_state(state: SeaState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the full state, for snapshotting.
    pub async fn snapshot(&self) -> SeaState {
        self.state.read().await.clone()
    }

    /// Set or replace a user's nickname.
    pub async fn set_profile(&self, user_id: &str, nickname: &str) {
        self.state
            .write()
            .await
            .profiles
            .insert(user_id.to_string(), nickname.to_string());
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.conversations.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    /// Number of reply rows across all bottles.
    pub async fn reply_count(&self) -> usize {
        self.state.read().await.replies.len()
    }
}

#[async_trait]
impl BottleStore for InMemoryStore {
    async fn insert_bottle(&self, bottle: NewBottle) -> anyhow::Result<Bottle> {
        let bottle = bottle.into_bottle(Uuid::new_v4().to_string());
        self.state
            .write()
            .await
            .bottles
            .insert(bottle.id.clone(), bottle.clone());
        debug!(bottle_id = %bottle.id, "Bottle stored");
        Ok(bottle)
    }

    async fn find_bottle(&self, id: &BottleId) -> anyhow::Result<Option<Bottle>> {
        Ok(self.state.read().await.bottles.get(id).cloned())
    }

    async fn find_eligible(&self, catcher: &UserId) -> anyhow::Result<Vec<Bottle>> {
        let state = self.state.read().await;
        Ok(state
            .bottles
            .values()
            .filter(|b| b.is_catchable_by(catcher))
            .cloned()
            .collect())
    }

    async fn record_pick(
        &self,
        id: &BottleId,
        expected_pick_count: u32,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Bottle>> {
        let mut state = self.state.write().await;
        let Some(bottle) = state.bottles.get_mut(id) else {
            return Ok(None);
        };
        if bottle.pick_count != expected_pick_count {
            return Ok(None);
        }
        let Some(transition) = bottle.apply_pick(now) else {
            return Ok(None);
        };
        *bottle = transition.bottle.clone();
        Ok(Some(transition.bottle))
    }

    async fn list_by_creator_since(
        &self,
        creator: &UserId,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Bottle>> {
        let state = self.state.read().await;
        let mut bottles: Vec<Bottle> = state
            .bottles
            .values()
            .filter(|b| b.creator_id == *creator && b.created_at >= since)
            .cloned()
            .collect();
        bottles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bottles)
    }

    async fn count_floating(&self) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .bottles
            .values()
            .filter(|b| b.status == BottleStatus::Floating)
            .count() as u64)
    }
}

#[async_trait]
impl ReplyStore for InMemoryStore {
    async fn insert_reply(&self, reply: NewReply) -> anyhow::Result<BottleReply> {
        let reply = reply.into_reply(Uuid::new_v4().to_string());
        self.state.write().await.replies.push(reply.clone());
        Ok(reply)
    }

    async fn replies_for(&self, bottle_id: &BottleId) -> anyhow::Result<Vec<BottleReply>> {
        let state = self.state.read().await;
        let mut replies: Vec<BottleReply> = state
            .replies
            .iter()
            .filter(|r| r.bottle_id == *bottle_id)
            .cloned()
            .collect();
        replies.sort_by_key(|r| r.created_at);
        Ok(replies)
    }
}

#[async_trait]
impl QuotaStore for InMemoryStore {
    async fn get_counter(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyCounter>> {
        let state = self.state.read().await;
        Ok(state.counters.get(&counter_key(user_id, date)).cloned())
    }

    async fn increment_counter(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
    ) -> anyhow::Result<DailyCounter> {
        let mut state = self.state.write().await;
        let counter = state
            .counters
            .entry(counter_key(user_id, date))
            .or_insert_with(|| DailyCounter::empty(user_id, date));
        counter.bump(kind);
        Ok(counter.clone())
    }

    async fn try_consume(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
        limit: u32,
    ) -> anyhow::Result<Option<DailyCounter>> {
        let mut state = self.state.write().await;
        let counter = state
            .counters
            .entry(counter_key(user_id, date))
            .or_insert_with(|| DailyCounter::empty(user_id, date));
        if counter.count(kind) >= limit {
            return Ok(None);
        }
        counter.bump(kind);
        Ok(Some(counter.clone()))
    }

    async fn release(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        kind: QuotaKind,
    ) -> anyhow::Result<DailyCounter> {
        let mut state = self.state.write().await;
        let Some(counter) = state.counters.get_mut(&counter_key(user_id, date)) else {
            return Ok(DailyCounter::empty(user_id, date));
        };
        counter.unbump(kind);
        Ok(counter.clone())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryStore {
    async fn display_names(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| {
                state
                    .profiles
                    .get(id)
                    .map(|name| (id.clone(), name.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl ConversationDirectory for InMemoryStore {
    async fn find_or_create_conversation(
        &self,
        initiator: &UserId,
        other: &UserId,
    ) -> anyhow::Result<ConversationId> {
        let pair = ConversationPair::new(initiator, other);
        let mut state = self.state.write().await;

        if let Some(existing) = state.conversations.iter().find(|c| c.pair == pair) {
            return Ok(existing.id.clone());
        }

        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            pair,
            status: ConversationStatus::Stranger,
            initiator_id: Some(initiator.clone()),
        };
        let id = conversation.id.clone();
        state.conversations.push(conversation);
        debug!(conversation_id = %id, "Conversation created");
        Ok(id)
    }
}

#[async_trait]
impl Notifier for InMemoryStore {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }
}
