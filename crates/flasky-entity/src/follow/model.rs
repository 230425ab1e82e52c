//! Follow edge model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flasky_core::types::UserId;

/// A directed edge: `follower_id` follows `followed_id`.
///
/// The ordered pair is the primary key. Every user has the reflexive
/// edge `(u, u)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Follow {
    /// The user doing the following.
    pub follower_id: UserId,
    /// The user being followed.
    pub followed_id: UserId,
    /// When the edge was created.
    pub timestamp: DateTime<Utc>,
}

impl Follow {
    /// Whether this is a user's edge to itself.
    pub fn is_self_edge(&self) -> bool {
        self.follower_id == self.followed_id
    }
}
