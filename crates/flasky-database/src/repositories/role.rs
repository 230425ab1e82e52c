//! Role repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use flasky_core::error::{AppError, ErrorKind};
use flasky_core::result::AppResult;
use flasky_core::types::RoleId;
use flasky_entity::user::{NewRole, Role};

use crate::store::RoleStore;

/// PostgreSQL-backed role rows.
#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleRepository {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role by id", e))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find role by name", e)
            })
    }

    async fn find_default(&self) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE is_default ORDER BY name LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find default role", e)
            })
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    async fn insert(&self, role: &NewRole) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, is_default, permissions) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(RoleId::new())
        .bind(&role.name)
        .bind(role.is_default)
        .bind(i32::from(role.permissions))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to create role '{}'", role.name),
                e,
            )
        })
    }

    async fn update(&self, role: &Role) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $2, is_default = $3, permissions = $4 \
             WHERE id = $1 RETURNING *",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(role.is_default)
        .bind(i32::from(role.permissions))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update role", e))?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", role.id)))
    }
}
