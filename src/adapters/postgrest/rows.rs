//! Row shapes for tables whose columns differ from the domain types.
//!
//! `bottles`, `bottle_replies`, `bottle_daily_limits` and
//! `notifications` map one-to-one onto domain structs and need nothing
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bottle::{Bottle, BottleStatus, UserId};
use crate::domain::conversation::{ConversationPair, ConversationStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct IdRow {
    pub id: String,
}

/// `profiles` projected to what the exchange reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    pub nickname: Option<String>,
}

/// Insert body for `conversations`.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversationRow {
    pub user_a_id: UserId,
    pub user_b_id: UserId,
    pub status: ConversationStatus,
    pub initiator_id: UserId,
}

impl NewConversationRow {
    pub fn stranger(pair: ConversationPair, initiator: &str) -> Self {
        Self {
            user_a_id: pair.user_a,
            user_b_id: pair.user_b,
            status: ConversationStatus::Stranger,
            initiator_id: initiator.to_string(),
        }
    }
}

/// Patch body for one draw on `bottles`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickPatch {
    pub pick_count: u32,
    pub status: BottleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<&Bottle> for PickPatch {
    fn from(bottle: &Bottle) -> Self {
        Self {
            pick_count: bottle.pick_count,
            status: bottle.status,
            returned_at: bottle.returned_at,
        }
    }
}
