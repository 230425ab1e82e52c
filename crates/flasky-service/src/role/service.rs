//! Seeds and reconciles stored roles against the role catalog.

use std::sync::Arc;

use tracing::{debug, info};

use flasky_auth::rbac::RoleCatalog;
use flasky_core::error::AppError;
use flasky_database::RoleStore;
use flasky_entity::user::{NewRole, Role};

/// Manages stored roles.
#[derive(Debug, Clone)]
pub struct RoleService {
    /// Role store.
    roles: Arc<dyn RoleStore>,
}

impl RoleService {
    /// Creates a new role service.
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Makes stored roles match `catalog` exactly.
    ///
    /// Each catalog role is found or created by name and its mask is
    /// rebuilt from scratch, so removing a permission from the catalog
    /// narrows the stored mask. Only the catalog's default role keeps the
    /// default flag; it is cleared on every other stored role. Running this
    /// twice changes nothing the second time. A default that names no
    /// catalog role is a `Configuration` error and nothing is written.
    pub async fn reconcile_roles(&self, catalog: &RoleCatalog) -> Result<Vec<Role>, AppError> {
        catalog.check()?;
        let mut reconciled = Vec::with_capacity(catalog.roles.len());

        for definition in &catalog.roles {
            let is_default = catalog.is_default(&definition.name);
            let role = match self.roles.find_by_name(&definition.name).await? {
                Some(mut role) => {
                    role.reset_permissions();
                    for perm in definition.permissions.iter() {
                        role.add_permission(perm);
                    }
                    role.is_default = is_default;
                    self.roles.update(&role).await?
                }
                None => {
                    let role = self
                        .roles
                        .insert(&NewRole {
                            name: definition.name.clone(),
                            is_default,
                            permissions: definition.permissions,
                        })
                        .await?;
                    info!(role = %role.name, "Created role");
                    role
                }
            };
            debug!(role = %role.name, permissions = %role.permissions, is_default, "Role reconciled");
            reconciled.push(role);
        }

        for mut stray in self.roles.list().await? {
            if stray.is_default && !catalog.is_default(&stray.name) {
                stray.is_default = false;
                self.roles.update(&stray).await?;
                info!(role = %stray.name, "Cleared default flag");
            }
        }

        info!(count = reconciled.len(), "Roles reconciled");
        Ok(reconciled)
    }

    /// The role new users receive, if one is flagged.
    pub async fn default_role(&self) -> Result<Option<Role>, AppError> {
        self.roles.find_default().await
    }

    /// Every stored role, ordered by name.
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.roles.list().await
    }
}
