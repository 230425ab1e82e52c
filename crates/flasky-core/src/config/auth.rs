//! Authentication configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Placeholder secret shipped in the default config.
pub const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Token signing and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide secret used to sign every token (HMAC-SHA256).
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Lifetime of email confirmation tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub confirmation_ttl_seconds: u64,
    /// Lifetime of password reset tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub reset_ttl_seconds: u64,
    /// Lifetime of API bearer tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub api_token_ttl_seconds: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4). Zero disables the entropy check.
    #[serde(default)]
    pub password_min_score: u8,
    /// Refuse to start with the placeholder secret.
    #[serde(default)]
    pub require_secret: bool,
}

impl AuthConfig {
    /// Builds a config around `secret_key` with every other field defaulted.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            confirmation_ttl_seconds: default_token_ttl(),
            reset_ttl_seconds: default_token_ttl(),
            api_token_ttl_seconds: default_token_ttl(),
            password_min_length: default_password_min(),
            password_min_score: 0,
            require_secret: false,
        }
    }

    /// Lifetime of email confirmation tokens.
    pub fn confirmation_ttl(&self) -> Result<Duration, AppError> {
        ttl("auth.confirmation_ttl_seconds", self.confirmation_ttl_seconds)
    }

    /// Lifetime of password reset tokens.
    pub fn reset_ttl(&self) -> Result<Duration, AppError> {
        ttl("auth.reset_ttl_seconds", self.reset_ttl_seconds)
    }

    /// Lifetime of API bearer tokens.
    pub fn api_token_ttl(&self) -> Result<Duration, AppError> {
        ttl("auth.api_token_ttl_seconds", self.api_token_ttl_seconds)
    }

    /// Rejects unusable settings.
    pub fn check(&self) -> Result<(), AppError> {
        self.confirmation_ttl()?;
        self.reset_ttl()?;
        self.api_token_ttl()?;
        if self.secret_key.is_empty() {
            return Err(AppError::configuration("auth.secret_key must not be empty"));
        }
        if self.require_secret && self.secret_key == PLACEHOLDER_SECRET {
            return Err(AppError::configuration(
                "auth.secret_key is still the placeholder value",
            ));
        }
        if self.password_min_score > 4 {
            return Err(AppError::configuration(
                "auth.password_min_score must be between 0 and 4",
            ));
        }
        Ok(())
    }
}

fn ttl(key: &str, seconds: u64) -> Result<Duration, AppError> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AppError::configuration(format!("{key} is out of range")))
}

fn default_secret_key() -> String {
    PLACEHOLDER_SECRET.to_string()
}

fn default_token_ttl() -> u64 {
    3600
}

fn default_password_min() -> usize {
    1
}
