//! Bottle domain types.
//!
//! Defines bottles, replies, and the single lifecycle transition a bottle
//! can take (floating → returned). All types are plain data so that every
//! adapter (in-memory, PostgREST) can persist them unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Identifier aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// User identifier as issued by the auth backend.
pub type UserId = String;

/// Bottle identifier.
pub type BottleId = String;

/// Reply identifier.
pub type ReplyId = String;

/// Default draw ceiling for newly thrown bottles.
pub const DEFAULT_MAX_PICKS: u32 = 10;

/// Lifecycle state of a bottle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleStatus {
    /// Still in the sea; may be caught.
    Floating,
    /// Drawn `max_picks` times and back on the creator's beach. Terminal.
    Returned,
}

impl std::fmt::Display for BottleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Floating => write!(f, "floating"),
            Self::Returned => write!(f, "returned"),
        }
    }
}

/// A persisted bottle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottle {
    pub id: BottleId,
    pub creator_id: UserId,
    pub content: String,
    /// Number of times this bottle has been drawn by others.
    pub pick_count: u32,
    /// Draws allowed before the bottle is returned.
    pub max_picks: u32,
    pub status: BottleStatus,
    /// Set only on the floating → returned transition.
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Bottle {
    /// Whether `user_id` may draw this bottle.
    ///
    /// A bottle is catchable iff it is floating, was thrown by someone
    /// else, and still has draws left.
    pub fn is_catchable_by(&self, user_id: &str) -> bool {
        self.status == BottleStatus::Floating
            && self.creator_id != user_id
            && self.pick_count < self.max_picks
    }

    /// Draws left before the bottle returns.
    pub fn picks_remaining(&self) -> u32 {
        self.max_picks.saturating_sub(self.pick_count)
    }

    /// Apply one draw at `now`.
    ///
    /// Increments `pick_count` and, when the new count reaches
    /// `max_picks`, moves the bottle to `Returned` and stamps
    /// `returned_at`. Returns `None` if the bottle can no longer be
    /// drawn, leaving it untouched.
    pub fn apply_pick(&self, now: DateTime<Utc>) -> Option<PickTransition> {
        if self.status != BottleStatus::Floating || self.pick_count >= self.max_picks {
            return None;
        }

        let mut next = self.clone();
        next.pick_count += 1;

        let returned = next.pick_count >= next.max_picks;
        if returned {
            next.status = BottleStatus::Returned;
            next.returned_at = Some(now);
        }

        Some(PickTransition {
            bottle: next,
            returned,
        })
    }
}

/// Outcome of a single draw applied to a bottle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickTransition {
    /// The bottle after the draw.
    pub bottle: Bottle,
    /// True if this draw was the terminal one.
    pub returned: bool,
}

/// Insert payload for a new bottle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBottle {
    pub creator_id: UserId,
    pub content: String,
    pub max_picks: u32,
    pub created_at: DateTime<Utc>,
}

impl NewBottle {
    /// Materialize the row with a store-assigned id.
    pub fn into_bottle(self, id: BottleId) -> Bottle {
        Bottle {
            id,
            creator_id: self.creator_id,
            content: self.content,
            pick_count: 0,
            max_picks: self.max_picks,
            status: BottleStatus::Floating,
            returned_at: None,
            created_at: self.created_at,
        }
    }
}

/// A reply attached to a bottle at one of its draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleReply {
    pub id: ReplyId,
    pub bottle_id: BottleId,
    pub user_id: UserId,
    pub content: String,
    /// Draw ordinal the reply belongs to.
    pub pick_number: u32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub bottle_id: BottleId,
    pub user_id: UserId,
    pub content: String,
    pub pick_number: u32,
    pub created_at: DateTime<Utc>,
}

impl NewReply {
    pub fn into_reply(self, id: ReplyId) -> BottleReply {
        BottleReply {
            id,
            bottle_id: self.bottle_id,
            user_id: self.user_id,
            content: self.content,
            pick_number: self.pick_number,
            created_at: self.created_at,
        }
    }
}

/// Trim user-entered text, returning `None` when nothing is left.
pub fn normalize_content(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
