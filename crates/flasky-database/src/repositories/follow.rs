//! Follow-edge repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use flasky_core::error::{AppError, ErrorKind};
use flasky_core::result::AppResult;
use flasky_core::types::{PageRequest, PageResponse, UserId};
use flasky_entity::follow::Follow;

use super::sql_window;
use crate::store::FollowStore;

/// PostgreSQL-backed follow edges.
#[derive(Debug, Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    /// Create a new follow repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pages through edges where `column = user`, skipping the reflexive edge.
    async fn page_by(
        &self,
        column: &'static str,
        user: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Follow>> {
        let (limit, offset) = sql_window(page);
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM follows WHERE {column} = $1 AND follower_id <> followed_id"
        ))
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count follows", e))?;

        let edges = sqlx::query_as::<_, Follow>(&format!(
            "SELECT * FROM follows WHERE {column} = $1 AND follower_id <> followed_id \
             ORDER BY timestamp DESC, follower_id, followed_id LIMIT $2 OFFSET $3"
        ))
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list follows", e))?;

        Ok(PageResponse::new(edges, page, total as u64))
    }
}

#[async_trait]
impl FollowStore for PgFollowRepository {
    async fn find(&self, follower: UserId, followed: UserId) -> AppResult<Option<Follow>> {
        sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower)
        .bind(followed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find follow", e))
    }

    async fn insert(&self, edge: &Follow) -> AppResult<bool> {
        // the pair is the primary key; a concurrent duplicate lands in DO NOTHING
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followed_id, timestamp) VALUES ($1, $2, $3) \
             ON CONFLICT (follower_id, followed_id) DO NOTHING",
        )
        .bind(edge.follower_id)
        .bind(edge.followed_id)
        .bind(edge.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert follow", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, follower: UserId, followed: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower)
            .bind(followed)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete follow", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn followers_of(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Follow>> {
        self.page_by("followed_id", user, page).await
    }

    async fn followed_by(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Follow>> {
        self.page_by("follower_id", user, page).await
    }
}
