//! Persistence contracts consumed by the services.
//!
//! Implementations own the uniqueness constraints: inserting or updating a
//! user whose email or username is taken fails with
//! [`ErrorKind::DuplicateEmail`](flasky_core::error::ErrorKind::DuplicateEmail)
//! or [`ErrorKind::DuplicateUsername`](flasky_core::error::ErrorKind::DuplicateUsername),
//! and inserting an existing follow edge reports `false` instead of failing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flasky_core::result::AppResult;
use flasky_core::types::{PageRequest, PageResponse, PostId, RoleId, UserId};
use flasky_entity::follow::Follow;
use flasky_entity::post::{NewPost, Post};
use flasky_entity::user::{NewRole, NewUser, Role, User};

use crate::memory::MemoryStore;
use crate::repositories::{
    PgFollowRepository, PgPostRepository, PgRoleRepository, PgUserRepository,
};

/// User rows.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by exact email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a user, assigning its id.
    async fn insert(&self, user: &NewUser) -> AppResult<User>;

    /// Overwrite every mutable column of an existing user.
    async fn update(&self, user: &User) -> AppResult<User>;

    /// Delete a user and its follow edges. Returns `true` if a row was removed.
    async fn delete(&self, id: UserId) -> AppResult<bool>;

    /// Record activity without rewriting the rest of the row.
    async fn touch_last_seen(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// Every user id, oldest registration first.
    async fn all_ids(&self) -> AppResult<Vec<UserId>>;
}

/// Role rows.
#[async_trait]
pub trait RoleStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a role by primary key.
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Find a role by name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// The role flagged as default, if any.
    async fn find_default(&self) -> AppResult<Option<Role>>;

    /// All roles ordered by name.
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Insert a role.
    async fn insert(&self, role: &NewRole) -> AppResult<Role>;

    /// Overwrite name, default flag, and mask of an existing role.
    async fn update(&self, role: &Role) -> AppResult<Role>;
}

/// Follow edges keyed by `(follower_id, followed_id)`.
#[async_trait]
pub trait FollowStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find the edge for an ordered pair.
    async fn find(&self, follower: UserId, followed: UserId) -> AppResult<Option<Follow>>;

    /// Insert an edge. Returns `false` when the pair already existed.
    async fn insert(&self, edge: &Follow) -> AppResult<bool>;

    /// Delete an edge. Returns `true` if one was removed.
    async fn delete(&self, follower: UserId, followed: UserId) -> AppResult<bool>;

    /// Edges pointing at `user`, newest first, reflexive edge excluded.
    async fn followers_of(&self, user: UserId, page: &PageRequest)
    -> AppResult<PageResponse<Follow>>;

    /// Edges leaving `user`, newest first, reflexive edge excluded.
    async fn followed_by(&self, user: UserId, page: &PageRequest)
    -> AppResult<PageResponse<Follow>>;
}

/// Post rows.
#[async_trait]
pub trait PostStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a post by primary key.
    async fn find_by_id(&self, id: PostId) -> AppResult<Option<Post>>;

    /// Insert a post.
    async fn insert(&self, post: &NewPost) -> AppResult<Post>;

    /// Overwrite the body of an existing post.
    async fn update(&self, post: &Post) -> AppResult<Post>;

    /// All posts, newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Post>>;

    /// Posts by one author, newest first.
    async fn list_by_author(
        &self,
        author: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>>;

    /// Posts whose author `follower` follows (itself included), newest first.
    async fn list_followed(
        &self,
        follower: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>>;
}

/// The full set of stores a service layer needs.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// Roles.
    pub roles: Arc<dyn RoleStore>,
    /// Follow edges.
    pub follows: Arc<dyn FollowStore>,
    /// Posts.
    pub posts: Arc<dyn PostStore>,
}

impl Stores {
    /// Stores backed by a single shared in-memory database.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            roles: store.clone(),
            follows: store.clone(),
            posts: store,
        }
    }

    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            follows: Arc::new(PgFollowRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool)),
        }
    }
}
