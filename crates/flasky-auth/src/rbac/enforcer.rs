//! RBAC enforcement logic: checks whether a caller holds a required permission.

use flasky_core::error::AppError;
use flasky_entity::permission::Permission;

use super::identity::Identity;

/// Enforces role-based access control for operations.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Checks whether the caller holds `permission`.
    ///
    /// Anonymous callers get `Unauthorized`; signed-in callers without the
    /// bit get `Forbidden`.
    pub fn require_permission(
        &self,
        identity: &Identity,
        permission: Permission,
    ) -> Result<(), AppError> {
        if identity.can(permission) {
            return Ok(());
        }
        match identity {
            Identity::Anonymous => Err(AppError::unauthorized("Authentication required")),
            Identity::Authenticated { user, .. } => Err(AppError::forbidden(format!(
                "User '{}' does not have permission '{permission}'",
                user.username
            ))),
        }
    }
}
