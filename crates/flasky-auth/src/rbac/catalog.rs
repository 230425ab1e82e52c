//! The fixed role catalog reconciled into storage at deploy time.

use serde::{Deserialize, Serialize};

use flasky_core::error::AppError;
use flasky_entity::permission::Permission;

/// Name of the baseline role.
pub const USER: &str = "User";
/// Name of the moderation role.
pub const MODERATOR: &str = "Moderator";
/// Name of the administration role.
pub const ADMINISTRATOR: &str = "Administrator";

/// One role and the permissions it must end up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Role name.
    pub name: String,
    /// Exact mask the stored role is reset to.
    pub permissions: Permission,
}

impl RoleDefinition {
    /// Builds a definition from a list of flags.
    pub fn new(name: impl Into<String>, permissions: &[Permission]) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.iter().copied().collect(),
        }
    }
}

/// The complete set of roles plus the name of the default one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalog {
    /// Roles, in reconciliation order.
    pub roles: Vec<RoleDefinition>,
    /// Role assigned to new users; `None` leaves no default.
    pub default_role: Option<String>,
}

impl RoleCatalog {
    /// Builds a catalog. The default role, if any, must be one of `roles`.
    pub fn new(roles: Vec<RoleDefinition>, default_role: Option<String>) -> Result<Self, AppError> {
        let catalog = Self {
            roles,
            default_role,
        };
        catalog.check()?;
        Ok(catalog)
    }

    /// Rejects a default role that names no catalog entry.
    pub fn check(&self) -> Result<(), AppError> {
        match self.default_role.as_deref() {
            Some(name) if self.get(name).is_none() => Err(AppError::configuration(format!(
                "Default role '{name}' is not in the role catalog"
            ))),
            _ => Ok(()),
        }
    }

    /// User, Moderator, and Administrator, with User as the default.
    pub fn standard() -> Self {
        let base = [Permission::FOLLOW, Permission::COMMENT, Permission::WRITE];
        let moderator = [
            Permission::FOLLOW,
            Permission::COMMENT,
            Permission::WRITE,
            Permission::MODERATE,
        ];
        Self {
            roles: vec![
                RoleDefinition::new(USER, &base),
                RoleDefinition::new(MODERATOR, &moderator),
                RoleDefinition::new(ADMINISTRATOR, &Permission::ALL),
            ],
            default_role: Some(USER.to_string()),
        }
    }

    /// Looks up a definition by role name.
    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Whether `name` is the catalog's default role.
    pub fn is_default(&self, name: &str) -> bool {
        self.default_role.as_deref() == Some(name)
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
