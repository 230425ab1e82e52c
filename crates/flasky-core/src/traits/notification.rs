//! Outbound notification sink (email delivery lives outside the core).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message handed to the notification sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    /// Subject line, already prefixed.
    pub subject: String,
    /// Template name, e.g. `auth/email/confirm`.
    pub template: String,
    /// Variables bound into the template.
    pub context: serde_json::Value,
}

/// Accepts notifications for asynchronous delivery.
///
/// Delivery is fire-and-forget: implementations log their own failures
/// instead of reporting them back to the caller.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug + 'static {
    /// Queues a notification.
    async fn send(&self, notification: Notification);
}
