//! In-memory store built on dashmap.
//!
//! Listings are ordered by timestamp, newest first, with insertion order
//! breaking ties so that results stay deterministic under a frozen clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use flasky_core::error::AppError;
use flasky_core::result::AppResult;
use flasky_core::types::{PageRequest, PageResponse, PostId, RoleId, UserId};
use flasky_entity::follow::Follow;
use flasky_entity::post::{NewPost, Post};
use flasky_entity::user::{NewRole, NewUser, Role, User};

use crate::store::{FollowStore, PostStore, RoleStore, UserStore};

/// A row plus the sequence number it was written with.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    row: T,
}

/// Single-process store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    roles: DashMap<RoleId, Role>,
    follows: DashMap<(UserId, UserId), Sequenced<Follow>>,
    posts: DashMap<PostId, Sequenced<Post>>,
    /// Serializes writes that must check a unique column first.
    unique_guard: Mutex<()>,
    seq: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn lock_unique(&self) -> MutexGuard<'_, ()> {
        self.unique_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fails if `email` or `username` belongs to a user other than `except`.
    fn check_user_unique(
        &self,
        email: &str,
        username: &str,
        except: Option<UserId>,
    ) -> AppResult<()> {
        for entry in self.users.iter() {
            if Some(entry.id) == except {
                continue;
            }
            if entry.email == email {
                return Err(AppError::duplicate_email(email));
            }
            if entry.username == username {
                return Err(AppError::duplicate_username(username));
            }
        }
        Ok(())
    }

    fn insert_user(&self, new: &NewUser) -> AppResult<User> {
        let _guard = self.lock_unique();
        self.check_user_unique(&new.email, &new.username, None)?;
        let user = User::from_new(UserId::new(), new.clone());
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&self, user: &User) -> AppResult<User> {
        let _guard = self.lock_unique();
        if !self.users.contains_key(&user.id) {
            return Err(AppError::not_found(format!("User {} not found", user.id)));
        }
        self.check_user_unique(&user.email, &user.username, Some(user.id))?;
        self.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    fn insert_role(&self, new: &NewRole) -> AppResult<Role> {
        let _guard = self.lock_unique();
        if self.roles.iter().any(|r| r.name == new.name) {
            return Err(AppError::database(format!(
                "Role '{}' already exists",
                new.name
            )));
        }
        let role = Role {
            id: RoleId::new(),
            name: new.name.clone(),
            is_default: new.is_default,
            permissions: new.permissions,
        };
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    fn sorted_follows(&self, keep: impl Fn(&Follow) -> bool) -> Vec<Follow> {
        let mut rows: Vec<Sequenced<Follow>> = self
            .follows
            .iter()
            .filter(|e| keep(&e.row))
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.row
                .timestamp
                .cmp(&a.row.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|s| s.row).collect()
    }

    fn sorted_posts(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut rows: Vec<Sequenced<Post>> = self
            .posts
            .iter()
            .filter(|e| keep(&e.row))
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.row
                .timestamp
                .cmp(&a.row.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|s| s.row).collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        self.insert_user(user)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        self.update_user(user)
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let removed = self.users.remove(&id).is_some();
        if removed {
            self.follows
                .retain(|(follower, followed), _| *follower != id && *followed != id);
            self.posts.retain(|_, p| p.row.author_id != id);
            debug!(user_id = %id, "Deleted user and cascaded rows");
        }
        Ok(removed)
    }

    async fn touch_last_seen(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.last_seen = at;
        }
        Ok(())
    }

    async fn all_ids(&self) -> AppResult<Vec<UserId>> {
        let mut users: Vec<(DateTime<Utc>, UserId)> =
            self.users.iter().map(|u| (u.member_since, u.id)).collect();
        users.sort();
        Ok(users.into_iter().map(|(_, id)| id).collect())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.get(&id).map(|r| r.clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.clone()))
    }

    async fn find_default(&self) -> AppResult<Option<Role>> {
        let mut defaults: Vec<Role> = self
            .roles
            .iter()
            .filter(|r| r.is_default)
            .map(|r| r.clone())
            .collect();
        defaults.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(defaults.into_iter().next())
    }

    async fn list(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.iter().map(|r| r.clone()).collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn insert(&self, role: &NewRole) -> AppResult<Role> {
        self.insert_role(role)
    }

    async fn update(&self, role: &Role) -> AppResult<Role> {
        match self.roles.get_mut(&role.id) {
            Some(mut existing) => {
                *existing = role.clone();
                Ok(role.clone())
            }
            None => Err(AppError::not_found(format!("Role {} not found", role.id))),
        }
    }
}

#[async_trait]
impl FollowStore for MemoryStore {
    async fn find(&self, follower: UserId, followed: UserId) -> AppResult<Option<Follow>> {
        Ok(self
            .follows
            .get(&(follower, followed))
            .map(|e| e.row.clone()))
    }

    async fn insert(&self, edge: &Follow) -> AppResult<bool> {
        match self.follows.entry((edge.follower_id, edge.followed_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Sequenced {
                    seq: self.next_seq(),
                    row: edge.clone(),
                });
                Ok(true)
            }
        }
    }

    async fn delete(&self, follower: UserId, followed: UserId) -> AppResult<bool> {
        Ok(self.follows.remove(&(follower, followed)).is_some())
    }

    async fn followers_of(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Follow>> {
        let rows = self.sorted_follows(|f| f.followed_id == user && !f.is_self_edge());
        Ok(PageResponse::from_ordered(rows, page))
    }

    async fn followed_by(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Follow>> {
        let rows = self.sorted_follows(|f| f.follower_id == user && !f.is_self_edge());
        Ok(PageResponse::from_ordered(rows, page))
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find_by_id(&self, id: PostId) -> AppResult<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.row.clone()))
    }

    async fn insert(&self, post: &NewPost) -> AppResult<Post> {
        let row = Post {
            id: PostId::new(),
            body: post.body.clone(),
            timestamp: post.timestamp,
            author_id: post.author_id,
        };
        self.posts.insert(
            row.id,
            Sequenced {
                seq: self.next_seq(),
                row: row.clone(),
            },
        );
        Ok(row)
    }

    async fn update(&self, post: &Post) -> AppResult<Post> {
        match self.posts.get_mut(&post.id) {
            Some(mut existing) => {
                existing.row.body = post.body.clone();
                Ok(existing.row.clone())
            }
            None => Err(AppError::not_found(format!("Post {} not found", post.id))),
        }
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Post>> {
        Ok(PageResponse::from_ordered(self.sorted_posts(|_| true), page))
    }

    async fn list_by_author(
        &self,
        author: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>> {
        let rows = self.sorted_posts(|p| p.author_id == author);
        Ok(PageResponse::from_ordered(rows, page))
    }

    async fn list_followed(
        &self,
        follower: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Post>> {
        let rows = self.sorted_posts(|p| self.follows.contains_key(&(follower, p.author_id)));
        Ok(PageResponse::from_ordered(rows, page))
    }
}
