//! Post creation, editing, and listings.

use std::sync::Arc;

use tracing::info;

use flasky_auth::acl::ContentGate;
use flasky_auth::rbac::Identity;
use flasky_core::error::AppError;
use flasky_core::traits::Clock;
use flasky_core::types::{PageRequest, PageResponse, PostId, UserId};
use flasky_database::PostStore;
use flasky_entity::permission::Permission;
use flasky_entity::post::{NewPost, Post};

/// Handles posts.
#[derive(Debug, Clone)]
pub struct PostService {
    /// Post store.
    posts: Arc<dyn PostStore>,
    /// Ownership and permission checks.
    gate: Arc<ContentGate>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Default listing page size.
    per_page: u64,
}

impl PostService {
    /// Creates a new post service.
    pub fn new(
        posts: Arc<dyn PostStore>,
        gate: Arc<ContentGate>,
        clock: Arc<dyn Clock>,
        per_page: u64,
    ) -> Self {
        Self {
            posts,
            gate,
            clock,
            per_page,
        }
    }

    /// The first page at the configured page size.
    pub fn first_page(&self) -> PageRequest {
        PageRequest::new(1, self.per_page)
    }

    /// Publishes a post. Requires WRITE.
    pub async fn create_post(&self, actor: &Identity, body: &str) -> Result<Post, AppError> {
        self.gate.authorize_action(actor, Permission::WRITE)?;
        let author_id = actor
            .user_id()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
        if body.trim().is_empty() {
            return Err(AppError::validation("Post body must not be empty"));
        }

        let post = self
            .posts
            .insert(&NewPost {
                body: body.to_string(),
                timestamp: self.clock.now(),
                author_id,
            })
            .await?;

        info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Replaces a post's body. Allowed for its author and administrators.
    pub async fn edit_post(
        &self,
        actor: &Identity,
        post_id: PostId,
        body: &str,
    ) -> Result<Post, AppError> {
        let mut post = self.get_post(post_id).await?;
        self.gate.authorize_edit(actor, post.author_id)?;
        if body.trim().is_empty() {
            return Err(AppError::validation("Post body must not be empty"));
        }

        post.body = body.to_string();
        let post = self.posts.update(&post).await?;

        info!(post_id = %post.id, editor_id = ?actor.user_id(), "Post edited");
        Ok(post)
    }

    /// Looks up a post.
    pub async fn get_post(&self, post_id: PostId) -> Result<Post, AppError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post {post_id} not found")))
    }

    /// Every post, newest first.
    pub async fn list_posts(&self, page: &PageRequest) -> Result<PageResponse<Post>, AppError> {
        self.posts.list(page).await
    }

    /// Posts by `author`, newest first.
    pub async fn posts_by_author(
        &self,
        author: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Post>, AppError> {
        self.posts.list_by_author(author, page).await
    }
}
