//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Comment, CommentView, Follow, Group, Post, PostView, User};

/// Which posts a feed listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post (the global feed)
    All,
    /// Posts filed under a group
    Group(Uuid),
    /// Posts written by a user
    Author(Uuid),
    /// Posts whose author is followed by the given user
    FollowedBy(Uuid),
}

/// Data persistence contract for groups, posts, comments and follow edges.
///
/// Listings are ordered newest-first (`created_at DESC, id DESC`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlogRepo: Send + Sync {
    // Group Operations
    async fn create_group(&self, group: Group) -> anyhow::Result<()>;
    async fn get_group(&self, slug: &str) -> anyhow::Result<Option<Group>>;
    async fn list_groups(&self) -> anyhow::Result<Vec<Group>>;

    // Post Operations
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    /// Overwrites text, group and image of an existing post.
    async fn update_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>>;
    /// Deletes a post and its comments; false if it did not exist.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn count_posts(&self, filter: PostFilter) -> anyhow::Result<i64>;
    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> anyhow::Result<Vec<PostView>>;

    // Comment Operations
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()>;
    /// Comments of a post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>>;

    // Follow Operations
    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
    /// Inserts the edge; false when the (user, author) pair already existed.
    async fn create_follow(&self, follow: Follow) -> anyhow::Result<bool>;
    /// Removes the edge; false when there was none.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
}

/// Account and session persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: User, password_hash: &str) -> anyhow::Result<()>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// The user together with their stored password hash.
    async fn get_credentials(&self, username: &str) -> anyhow::Result<Option<(User, String)>>;

    /// Sessions are keyed by a digest of the cookie token, never the token itself.
    async fn create_session(&self, token_digest: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> anyhow::Result<()>;
    /// The session's user, if the session exists and has not expired.
    async fn get_session_user(&self, token_digest: &str) -> anyhow::Result<Option<User>>;
    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()>;
}

/// Media storage contract for handling uploads and thumbnails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns the media path for the Post model.
    /// Bytes that do not decode as an image yield `AppError::ValidationError`.
    async fn save_upload(&self, data: Vec<u8>, filename: &str) -> crate::error::Result<String>;
    /// Returns the URL of the original media.
    fn url(&self, media_id: &str) -> String;
    /// Returns the URL of the thumbnail.
    fn thumbnail_url(&self, media_id: &str) -> String;
}

/// Password and session-token primitives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a self-describing (PHC string) password hash.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// A fresh, unguessable token to hand to the client.
    fn new_session_token(&self) -> anyhow::Result<String>;

    /// Stable digest under which a token is stored.
    fn token_digest(&self, token: &str) -> String;
}

/// Process-wide cache for rendered page fragments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn insert(&self, key: String, rendered: String);
    /// Drops every entry.
    async fn clear(&self);
}

/// A cache that never stores anything.
pub struct NoCache;

#[async_trait]
impl PageCache for NoCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn insert(&self, _key: String, _rendered: String) {}

    async fn clear(&self) {}
}
