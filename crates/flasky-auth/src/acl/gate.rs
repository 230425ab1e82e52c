//! Decides whether a caller may edit content or perform a gated action.

use tracing::debug;

use flasky_core::error::AppError;
use flasky_core::types::UserId;
use flasky_entity::permission::Permission;

use crate::rbac::{Identity, RbacEnforcer};

/// Gate consulted before content is created, edited, or moderated.
#[derive(Debug, Clone, Default)]
pub struct ContentGate {
    enforcer: RbacEnforcer,
}

impl ContentGate {
    /// Creates a gate.
    pub fn new() -> Self {
        Self {
            enforcer: RbacEnforcer::new(),
        }
    }

    /// Allows the owner of the content and administrators.
    pub fn authorize_edit(&self, actor: &Identity, owner_id: UserId) -> Result<(), AppError> {
        let Some(actor_id) = actor.user_id() else {
            return Err(AppError::unauthorized("Authentication required"));
        };
        if actor_id == owner_id || actor.is_administrator() {
            return Ok(());
        }
        debug!(user_id = %actor_id, owner_id = %owner_id, "Edit denied");
        Err(AppError::forbidden("Only the owner or an administrator may edit this content"))
    }

    /// Allows callers whose role grants `permission`.
    pub fn authorize_action(&self, actor: &Identity, permission: Permission) -> Result<(), AppError> {
        self.enforcer.require_permission(actor, permission)
    }

    /// Rejects signed-in callers that have not confirmed their address.
    ///
    /// Anonymous callers pass; the authentication check is separate.
    pub fn require_confirmed(&self, actor: &Identity) -> Result<(), AppError> {
        match actor.user() {
            Some(user) if !user.confirmed => Err(AppError::forbidden("Unconfirmed account")),
            _ => Ok(()),
        }
    }
}
