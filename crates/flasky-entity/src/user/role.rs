//! Role entity: a named permission mask.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flasky_core::types::RoleId;

use crate::permission::Permission;

/// A role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Whether new users receive this role.
    pub is_default: bool,
    /// Combined permission mask.
    #[sqlx(try_from = "i32")]
    pub permissions: Permission,
}

impl Role {
    /// Sets `perm`. No-op if already set.
    pub fn add_permission(&mut self, perm: Permission) {
        if !self.has_permission(perm) {
            self.permissions.insert(perm);
        }
    }

    /// Clears `perm`. No-op if already clear.
    pub fn remove_permission(&mut self, perm: Permission) {
        if self.has_permission(perm) {
            self.permissions.remove(perm);
        }
    }

    /// Clears every permission.
    pub fn reset_permissions(&mut self) {
        self.permissions = Permission::NONE;
    }

    /// `(mask & perm) == perm`.
    pub fn has_permission(&self, perm: Permission) -> bool {
        self.permissions.contains(perm)
    }
}

/// Data required to insert a role.
#[derive(Debug, Clone)]
pub struct NewRole {
    /// Role name.
    pub name: String,
    /// Default flag.
    pub is_default: bool,
    /// Permission mask.
    pub permissions: Permission,
}
