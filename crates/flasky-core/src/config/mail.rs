//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// Settings used when composing notification messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Prefix prepended to every subject line.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Sender address.
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
            sender: default_sender(),
        }
    }
}

fn default_subject_prefix() -> String {
    "[Flasky]".to_string()
}

fn default_sender() -> String {
    "Flasky Admin <flasky@example.com>".to_string()
}
