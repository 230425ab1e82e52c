//! The caller on whose behalf an operation runs.

use flasky_core::types::UserId;
use flasky_entity::permission::Permission;
use flasky_entity::user::{Role, User};

/// Either a signed-in user (with the role resolved) or nobody.
#[derive(Debug, Clone)]
pub enum Identity {
    /// A persisted user and its role, if one is assigned.
    Authenticated {
        /// The user.
        user: User,
        /// The user's role.
        role: Option<Role>,
    },
    /// No session.
    Anonymous,
}

impl Identity {
    /// Wraps a user and its role.
    pub fn authenticated(user: User, role: Option<Role>) -> Self {
        Self::Authenticated { user, role }
    }

    /// Whether the role grants every bit of `perm`. False without a role.
    pub fn can(&self, perm: Permission) -> bool {
        match self {
            Self::Authenticated {
                role: Some(role), ..
            } => role.has_permission(perm),
            _ => false,
        }
    }

    /// Shorthand for `can(Permission::ADMIN)`.
    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    /// Whether this is the anonymous sentinel.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// The signed-in user.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    /// The signed-in user's id.
    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    /// The resolved role.
    pub fn role(&self) -> Option<&Role> {
        match self {
            Self::Authenticated { role, .. } => role.as_ref(),
            Self::Anonymous => None,
        }
    }
}
