//! Notification sink that writes each message to the tracing log.

use async_trait::async_trait;
use tracing::info;

use flasky_core::traits::{Notification, NotificationSink};

/// Logs notifications instead of delivering them.
///
/// The template context is not logged; it carries bearer tokens.
#[derive(Debug, Clone)]
pub struct LogNotificationSink {
    sender: String,
}

impl LogNotificationSink {
    /// Creates a sink that reports `sender` as the from-address.
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, notification: Notification) {
        info!(
            from = %self.sender,
            to = %notification.to,
            subject = %notification.subject,
            template = %notification.template,
            "Notification queued"
        );
    }
}
