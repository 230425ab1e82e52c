//! Post repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use flasky_core::error::{AppError, ErrorKind};
use flasky_core::result::AppResult;
use flasky_core::types::{PageRequest, PageResponse, PostId, UserId};
use flasky_entity::post::{NewPost, Post};

use super::sql_window;
use crate::store::PostStore;

/// PostgreSQL-backed posts.
#[derive(Debug, Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Create a new post repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostRepository {
    async fn find_by_id(&self, id: PostId) -> AppResult<Option<Post>> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find post", e))
    }

    async fn insert(&self, post: &NewPost) -> AppResult<Post> {
        sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, body, timestamp, author_id) VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(PostId::new())
        .bind(&post.body)
        .bind(post.timestamp)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create post", e))
    }

    async fn update(&self, post: &Post) -> AppResult<Post> {
        sqlx::query_as::<_, Post>("UPDATE posts SET body = $2 WHERE id = $1 RETURNING *")
            .bind(post.id)
            .bind(&post.body)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update post", e))?
            .ok_or_else(|| AppError::not_found(format!("Post {} not found", post.id)))
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Post>> {
        let (limit, offset) = sql_window(page);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count posts", e))?;

        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts ORDER BY timestamp DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list posts", e))?;

        Ok(PageResponse::new(posts, page, total as u64))
    }

    async fn list_by_author(
        &self,
        author: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>> {
        let (limit, offset) = sql_window(page);
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count author posts", e)
            })?;

        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE author_id = $1 \
             ORDER BY timestamp DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(author)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list author posts", e)
        })?;

        Ok(PageResponse::new(posts, page, total as u64))
    }

    async fn list_followed(
        &self,
        follower: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>> {
        let (limit, offset) = sql_window(page);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts p \
             JOIN follows f ON f.followed_id = p.author_id \
             WHERE f.follower_id = $1",
        )
        .bind(follower)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count followed posts", e)
        })?;

        let posts = sqlx::query_as::<_, Post>(
            "SELECT p.* FROM posts p \
             JOIN follows f ON f.followed_id = p.author_id \
             WHERE f.follower_id = $1 \
             ORDER BY p.timestamp DESC, p.id DESC LIMIT $2 OFFSET $3",
        )
        .bind(follower)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list followed posts", e)
        })?;

        Ok(PageResponse::new(posts, page, total as u64))
    }
}
