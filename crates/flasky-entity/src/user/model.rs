//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flasky_core::types::{RoleId, UserId};

use super::avatar;

/// A registered user.
///
/// The password is write-only: only its salted hash is held, it is never
/// serialized, and there is no accessor that yields a plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Unique login name.
    pub username: String,
    /// Assigned role.
    pub role_id: Option<RoleId>,
    /// Argon2 password hash.
    #[serde(skip)]
    password_hash: Option<String>,
    /// Whether the email address has been confirmed.
    pub confirmed: bool,
    /// Real name.
    pub name: Option<String>,
    /// Free-form location.
    pub location: Option<String>,
    /// Profile text.
    pub about_me: Option<String>,
    /// Registration time.
    pub member_since: DateTime<Utc>,
    /// Last authenticated activity.
    pub last_seen: DateTime<Utc>,
    /// Cached avatar key derived from the email.
    pub avatar_hash: Option<String>,
}

impl User {
    /// Materializes a persisted user from its insert payload.
    pub fn from_new(id: UserId, new: NewUser) -> Self {
        Self {
            id,
            email: new.email,
            username: new.username,
            role_id: new.role_id,
            password_hash: new.password_hash,
            confirmed: new.confirmed,
            name: new.name,
            location: new.location,
            about_me: new.about_me,
            member_since: new.member_since,
            last_seen: new.member_since,
            avatar_hash: new.avatar_hash,
        }
    }

    /// The stored password hash, if a credential has been set.
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Replaces the stored password hash.
    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = Some(hash);
    }

    /// Changes the email address and recomputes the avatar key.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.avatar_hash = Some(avatar::avatar_hash(&self.email));
    }

    /// Returns the avatar key, filling the cache if it is empty.
    pub fn ensure_avatar_hash(&mut self) -> &str {
        self.avatar_hash
            .get_or_insert_with(|| avatar::avatar_hash(&self.email))
    }

    /// Avatar image URL for this user.
    pub fn avatar_url(&self, size: u32, default: &str, rating: &str) -> String {
        let hash = self
            .avatar_hash
            .clone()
            .unwrap_or_else(|| avatar::avatar_hash(&self.email));
        avatar::avatar_url(&hash, size, default, rating)
    }
}

/// Data required to insert a new user. A `NewUser` has no id yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Assigned role.
    pub role_id: Option<RoleId>,
    /// Pre-hashed password.
    pub password_hash: Option<String>,
    /// Whether the address starts out confirmed.
    pub confirmed: bool,
    /// Real name.
    pub name: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Profile text.
    pub about_me: Option<String>,
    /// Registration time.
    pub member_since: DateTime<Utc>,
    /// Avatar key derived from the email.
    pub avatar_hash: Option<String>,
}

impl NewUser {
    /// Starts an insert payload; the avatar key is computed from `email`.
    pub fn new(email: impl Into<String>, username: impl Into<String>, now: DateTime<Utc>) -> Self {
        let email = email.into();
        let avatar_hash = Some(avatar::avatar_hash(&email));
        Self {
            email,
            username: username.into(),
            role_id: None,
            password_hash: None,
            confirmed: false,
            name: None,
            location: None,
            about_me: None,
            member_since: now,
            avatar_hash,
        }
    }
}

/// Anything that may or may not have been persisted as a user yet.
///
/// Follow-graph queries answer `false` for values without an id instead of
/// guessing about rows that do not exist.
pub trait Persisted {
    /// The user id, once the row exists.
    fn persisted_id(&self) -> Option<UserId>;
}

impl Persisted for User {
    fn persisted_id(&self) -> Option<UserId> {
        Some(self.id)
    }
}

impl Persisted for NewUser {
    fn persisted_id(&self) -> Option<UserId> {
        None
    }
}

impl Persisted for UserId {
    fn persisted_id(&self) -> Option<UserId> {
        Some(*self)
    }
}
