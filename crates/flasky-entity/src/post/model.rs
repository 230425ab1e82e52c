//! Post entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flasky_core::types::{PostId, UserId};

/// A blog post. `body` is Markdown source; rendering it is the
/// presentation layer's concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    /// Unique post identifier.
    pub id: PostId,
    /// Markdown body.
    pub body: String,
    /// Creation time; listings are ordered newest first.
    pub timestamp: DateTime<Utc>,
    /// Author.
    pub author_id: UserId,
}

/// Data required to insert a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Markdown body.
    pub body: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Author.
    pub author_id: UserId,
}
