//! Token claims carried inside every signed token.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flasky_core::types::UserId;

/// What a token may be redeemed for.
///
/// API session tokens carry no purpose at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Email address confirmation.
    Confirm,
    /// Password reset.
    Reset,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirm => write!(f, "confirm"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Claims payload embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user the token was issued for.
    pub sub: UserId,
    /// Purpose tag; absent on session tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<TokenPurpose>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Whether the token is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// A freshly issued token and the instant it stops verifying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact JWS string, safe for URLs and headers.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}
