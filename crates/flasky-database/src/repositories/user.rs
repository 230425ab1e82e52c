//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flasky_core::error::{AppError, ErrorKind};
use flasky_core::result::AppResult;
use flasky_core::types::UserId;
use flasky_entity::user::{NewUser, User};

use crate::store::UserStore;

const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_USERNAME_KEY: &str = "users_username_key";

/// PostgreSQL-backed user rows.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique-constraint violations on `users` to domain errors.
fn map_write_error(e: sqlx::Error, email: &str, username: &str, action: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(USERS_EMAIL_KEY) => {
            AppError::duplicate_email(email)
        }
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(USERS_USERNAME_KEY) => {
            AppError::duplicate_username(username)
        }
        _ => AppError::with_source(ErrorKind::Database, format!("Failed to {action} user"), e),
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, username, role_id, password_hash, confirmed, \
                                name, location, about_me, member_since, last_seen, avatar_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11) \
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role_id)
        .bind(&user.password_hash)
        .bind(user.confirmed)
        .bind(&user.name)
        .bind(&user.location)
        .bind(&user.about_me)
        .bind(user.member_since)
        .bind(&user.avatar_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user.email, &user.username, "create"))
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET email = $2, username = $3, role_id = $4, password_hash = $5, \
                              confirmed = $6, name = $7, location = $8, about_me = $9, \
                              last_seen = $10, avatar_hash = $11 \
             WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role_id)
        .bind(user.password_hash())
        .bind(user.confirmed)
        .bind(&user.name)
        .bind(&user.location)
        .bind(&user.about_me)
        .bind(user.last_seen)
        .bind(&user.avatar_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user.email, &user.username, "update"))?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        // follows rows cascade through their foreign keys
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_seen(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_seen = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last seen", e)
            })?;
        Ok(())
    }

    async fn all_ids(&self) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT id FROM users ORDER BY member_since ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user ids", e))
    }
}
