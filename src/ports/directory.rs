//! Directory Ports - Profile and Conversation Collaborators
//!
//! The exchange only reads display names from profiles and asks the
//! messaging side to find-or-create a one-to-one conversation.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::bottle::UserId;
use crate::domain::conversation::ConversationId;

/// Trait for profile lookups.
#[async_trait]
pub trait ProfileDirectory: Send + Sync + 'static {
  /// Display names for a batch of users.
  ///
  /// Users without a profile, or without a nickname, are simply absent
  /// from the returned map; callers substitute a placeholder.
  async fn display_names(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, String>>;
}

/// Trait for the messaging collaborator.
#[async_trait]
pub trait ConversationDirectory: Send + Sync + 'static {
  /// Find the conversation between two users, creating it if absent.
  ///
  /// Pairing is order-independent: `(a, b)` and `(b, a)` resolve to the
  /// same id, and repeated calls never create a duplicate. New
  /// conversations start as `stranger` with `initiator` as initiator.
  async fn find_or_create_conversation(
    &self,
    initiator: &UserId,
    other: &UserId,
  ) -> anyhow::Result<ConversationId>;
}
