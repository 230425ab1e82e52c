//! Composes account emails and hands them to the notification sink.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use flasky_core::config::MailConfig;
use flasky_core::traits::{Notification, NotificationSink};
use flasky_entity::user::User;

/// Template names understood by the delivery side.
pub mod templates {
    /// Account confirmation email.
    pub const CONFIRM: &str = "auth/email/confirm";
    /// Password reset email.
    pub const RESET_PASSWORD: &str = "auth/email/reset_password";
}

/// Builds prefixed, templated messages for a user.
#[derive(Debug, Clone)]
pub struct Mailer {
    sink: Arc<dyn NotificationSink>,
    subject_prefix: String,
}

impl Mailer {
    /// Creates a mailer over `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>, config: &MailConfig) -> Self {
        Self {
            sink,
            subject_prefix: config.subject_prefix.clone(),
        }
    }

    /// Sends `template` to `user` with the token bound into its context.
    pub async fn send_with_token(&self, user: &User, subject: &str, template: &str, token: &str) {
        let notification = Notification {
            to: user.email.clone(),
            subject: format!("{} {}", self.subject_prefix, subject),
            template: template.to_string(),
            context: json!({
                "user_id": user.id,
                "username": user.username,
                "token": token,
            }),
        };
        debug!(user_id = %user.id, template, "Sending account email");
        self.sink.send(notification).await;
    }

    /// Sends the confirmation email.
    pub async fn send_confirmation(&self, user: &User, token: &str) {
        self.send_with_token(user, "Confirm Your Account", templates::CONFIRM, token)
            .await;
    }

    /// Sends the password reset email.
    pub async fn send_password_reset(&self, user: &User, token: &str) {
        self.send_with_token(user, "Reset Your Password", templates::RESET_PASSWORD, token)
            .await;
    }
}
