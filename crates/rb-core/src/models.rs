//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Blog.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::urls;

/// A registered author. Usernames are unique and appear in profile URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            username: username.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn profile_url(&self) -> String {
        urls::profile(&self.username)
    }

    pub fn follow_url(&self) -> String {
        urls::profile_follow(&self.username)
    }

    pub fn unfollow_url(&self) -> String {
        urls::profile_unfollow(&self.username)
    }
}

/// A topical collection of posts (e.g., /group/rust/)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    /// The URL slug; fixed once the group exists
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl Group {
    pub fn new(slug: &str, title: &str, description: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    pub fn url(&self) -> String {
        urls::group(&self.slug)
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// The fundamental unit of publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Path of the upload relative to the media root, as handed out by MediaStore
    pub image: Option<String>,
}

impl Post {
    pub fn new(author_id: Uuid, text: &str, group_id: Option<Uuid>, image: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.to_string(),
            created_at: Utc::now(),
            author_id,
            group_id,
            image,
        }
    }

    pub fn url(&self) -> String {
        urls::post_detail(self.id)
    }

    pub fn edit_url(&self) -> String {
        urls::post_edit(self.id)
    }

    pub fn comment_url(&self) -> String {
        urls::add_comment(self.id)
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&truncate_chars(&self.text, 15))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, text: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&truncate_chars(&self.text, 20))
    }
}

/// Directed edge: `user_id` receives `author_id`'s posts in their followed feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
}

impl Follow {
    pub fn new(user_id: Uuid, author_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            author_id,
        }
    }
}

/// A post joined with the rows needed to display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
    /// Public URLs, filled in by the engine from the MediaStore
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl PostView {
    pub fn group_url(&self) -> Option<String> {
        self.group.as_ref().map(Group::url)
    }

    pub fn group_title(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}

/// The requester: anonymous or an authenticated User.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    /// True when the requester is the given user.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user().is_some_and(|u| u.id == user_id)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
