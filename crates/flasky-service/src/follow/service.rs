//! Follow graph operations and the followed-posts timeline.

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info};

use flasky_core::error::AppError;
use flasky_core::traits::Clock;
use flasky_core::types::{PageRequest, PageResponse, UserId};
use flasky_database::{FollowStore, PostStore, Stores, UserStore};
use flasky_entity::follow::Follow;
use flasky_entity::post::Post;
use flasky_entity::user::Persisted;

/// Manages follow edges between users.
///
/// Every user has a permanent edge to itself, so the followed-posts
/// timeline includes the user's own posts. Listings and counts hide it.
#[derive(Debug, Clone)]
pub struct FollowService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Follow store.
    follows: Arc<dyn FollowStore>,
    /// Post store.
    posts: Arc<dyn PostStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl FollowService {
    /// Creates a new follow service.
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: stores.users.clone(),
            follows: stores.follows.clone(),
            posts: stores.posts.clone(),
            clock,
        }
    }

    async fn require_user(&self, id: UserId) -> Result<(), AppError> {
        match self.users.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("User {id} not found"))),
        }
    }

    /// Makes `follower` follow `followed`. Following twice is a no-op.
    pub async fn follow(&self, follower: UserId, followed: UserId) -> Result<(), AppError> {
        self.require_user(follower).await?;
        self.require_user(followed).await?;

        let edge = Follow {
            follower_id: follower,
            followed_id: followed,
            timestamp: self.clock.now(),
        };
        if self.follows.insert(&edge).await? {
            info!(follower_id = %follower, followed_id = %followed, "Follow created");
        } else {
            debug!(follower_id = %follower, followed_id = %followed, "Already following");
        }
        Ok(())
    }

    /// Removes the edge if present. The self-edge is never removed.
    pub async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<(), AppError> {
        if follower == followed {
            debug!(user_id = %follower, "Ignoring unfollow of self");
            return Ok(());
        }
        if self.follows.delete(follower, followed).await? {
            info!(follower_id = %follower, followed_id = %followed, "Follow removed");
        }
        Ok(())
    }

    /// Whether `follower` follows `followed`.
    ///
    /// False when either side has not been persisted yet.
    pub async fn is_following(
        &self,
        follower: &impl Persisted,
        followed: &impl Persisted,
    ) -> Result<bool, AppError> {
        let (Some(a), Some(b)) = (follower.persisted_id(), followed.persisted_id()) else {
            return Ok(false);
        };
        Ok(self.follows.find(a, b).await?.is_some())
    }

    /// Whether `user` is followed by `follower`.
    ///
    /// False when either side has not been persisted yet.
    pub async fn is_followed_by(
        &self,
        user: &impl Persisted,
        follower: &impl Persisted,
    ) -> Result<bool, AppError> {
        self.is_following(follower, user).await
    }

    /// Users following `user`, newest first.
    pub async fn followers(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Follow>, AppError> {
        self.follows.followers_of(user, page).await
    }

    /// Users `user` follows, newest first.
    pub async fn followed(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Follow>, AppError> {
        self.follows.followed_by(user, page).await
    }

    /// Number of other users following `user`.
    pub async fn follower_count(&self, user: UserId) -> Result<u64, AppError> {
        Ok(self
            .follows
            .followers_of(user, &PageRequest::new(1, 1))
            .await?
            .total_items)
    }

    /// Number of other users `user` follows.
    pub async fn followed_count(&self, user: UserId) -> Result<u64, AppError> {
        Ok(self
            .follows
            .followed_by(user, &PageRequest::new(1, 1))
            .await?
            .total_items)
    }

    /// Posts by everyone `user` follows, itself included, newest first.
    pub async fn posts_from_followed(
        &self,
        user: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Post>, AppError> {
        self.posts.list_followed(user, page).await
    }

    /// The same timeline as [`Self::posts_from_followed`], fetched a page at
    /// a time as the stream is polled.
    pub fn followed_posts_stream(
        &self,
        user: UserId,
        page_size: u64,
    ) -> impl Stream<Item = Result<Post, AppError>> + Send + 'static {
        let posts = self.posts.clone();
        stream::try_unfold(Some(PageRequest::new(1, page_size)), move |next| {
            let posts = posts.clone();
            async move {
                let Some(request) = next else {
                    return Ok::<_, AppError>(None);
                };
                let page = posts.list_followed(user, &request).await?;
                let following = page.has_next.then(|| request.next());
                let items = stream::iter(page.items.into_iter().map(Ok::<Post, AppError>));
                Ok::<_, AppError>(Some((items, following)))
            }
        })
        .try_flatten()
    }

    /// Gives every user its self-edge. Returns how many were missing.
    pub async fn add_self_follows(&self) -> Result<u64, AppError> {
        let now = self.clock.now();
        let mut created = 0;
        for id in self.users.all_ids().await? {
            let edge = Follow {
                follower_id: id,
                followed_id: id,
                timestamp: now,
            };
            if self.follows.insert(&edge).await? {
                created += 1;
            }
        }
        info!(created, "Self-follow backfill finished");
        Ok(created)
    }
}
