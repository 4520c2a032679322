//! Conversation pairing used by the "reply and greet" hand-off.

use serde::{Deserialize, Serialize};

use super::bottle::UserId;

/// Conversation identifier issued by the messaging backend.
pub type ConversationId = String;

/// Relationship stage of a one-to-one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// Created by a greeting; no reciprocal reply yet.
    Stranger,
    Friend,
}

/// Order-independent key for a pair of users.
///
/// `user_a` is always the lexicographically smaller id, so
/// `(alice, bob)` and `(bob, alice)` map to the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationPair {
    pub user_a: UserId,
    pub user_b: UserId,
}

impl ConversationPair {
    pub fn new(first: &str, second: &str) -> Self {
        let (user_a, user_b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
        }
    }
}

/// A conversation row as seen by the bottle subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub pair: ConversationPair,
    pub status: ConversationStatus,
    pub initiator_id: Option<UserId>,
}
