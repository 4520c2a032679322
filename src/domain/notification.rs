//! Notifications raised by bottle activity.

use serde::{Deserialize, Serialize};

use super::bottle::{Bottle, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone replied to the recipient's bottle.
    BottleReply,
    /// The recipient's bottle reached its draw ceiling and came back.
    BottleReturned,
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub content: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

impl Notification {
    pub fn bottle_reply(bottle: &Bottle, reply_content: &str) -> Self {
        Self {
            user_id: bottle.creator_id.clone(),
            kind: NotificationKind::BottleReply,
            title: "你的瓶子收到了新回复".to_string(),
            content: Some(reply_content.to_string()),
            reference_type: Some("bottle".to_string()),
            reference_id: Some(bottle.id.clone()),
        }
    }

    pub fn bottle_returned(bottle: &Bottle) -> Self {
        Self {
            user_id: bottle.creator_id.clone(),
            kind: NotificationKind::BottleReturned,
            title: "你的瓶子漂回来了".to_string(),
            content: Some(format!("已被打捞 {}/{} 次", bottle.pick_count, bottle.max_picks)),
            reference_type: Some("bottle".to_string()),
            reference_id: Some(bottle.id.clone()),
        }
    }
}
