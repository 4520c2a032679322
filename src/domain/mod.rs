//! Domain layer - Core bottle exchange logic and models.
//!
//! Pure types and rules: bottle lifecycle, eligibility, quotas,
//! conversation pairing, uniform selection, and the interaction state
//! machine. No I/O here (hexagonal architecture inner ring).

pub mod bottle;
pub mod conversation;
pub mod error;
pub mod interaction;
pub mod notification;
pub mod quota;
pub mod selection;

// Re-export core types for convenience
pub use bottle::{
    Bottle, BottleId, BottleReply, BottleStatus, NewBottle, NewReply, PickTransition, ReplyId,
    UserId,
};
pub use conversation::{Conversation, ConversationId, ConversationPair, ConversationStatus};
pub use error::ExchangeError;
pub use interaction::{CatchTicket, Interaction, PostCatchAction, View};
pub use notification::{Notification, NotificationKind};
pub use quota::{DailyCounter, DailyUsage, QuotaKind, QuotaPolicy};
