//! Notifier Port - Outbound User Notifications
//!
//! Delivery to subscribed clients is the backend's concern; the exchange
//! only records that a notification should exist.

use async_trait::async_trait;

use crate::domain::notification::Notification;

/// Trait for notification sinks.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
  /// Record a notification for its recipient.
  async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Sink that drops everything. Used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
  async fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
    Ok(())
  }
}
