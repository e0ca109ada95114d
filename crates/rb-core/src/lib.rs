//! rusty-blog/crates/rb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Blog.

pub mod accounts;
pub mod blog;
pub mod error;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod traits;
pub mod urls;

// Re-exporting for easier access in other crates
pub use accounts::*;
pub use blog::*;
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn display_truncates_like_listings_expect() {
        let user = User::new("user_1");
        let group = Group::new("group_slug_1", "group_1", "first group");
        let post = Post::new(user.id, "A tester walks into a bar...", Some(group.id), None);
        let comment = Comment::new(post.id, user.id, "Runs into a bar. Crawls into a bar.");

        assert_eq!(group.to_string(), "group_1");
        assert_eq!(post.to_string(), "A tester walks ");
        assert_eq!(comment.to_string(), "Runs into a bar. Cra");
    }

    #[test]
    fn models_link_to_their_routes() {
        let user = User::new("leo");
        let group = Group::new("rust", "Rust", "");
        let post = Post::new(user.id, "text", Some(group.id), None);

        assert_eq!(user.follow_url(), "/profile/leo/follow/");
        assert_eq!(user.unfollow_url(), "/profile/leo/unfollow/");
        assert_eq!(group.url(), "/group/rust/");
        assert_eq!(post.url(), format!("/posts/{}/", post.id));
        assert_eq!(post.edit_url(), format!("/posts/{}/edit/", post.id));
        assert_eq!(post.comment_url(), format!("/posts/{}/comment/", post.id));
    }

    #[test]
    fn identity_helpers() {
        let user = User::new("leo");
        let id = user.id;
        let identity = Identity::User(user);
        assert!(identity.is_authenticated());
        assert!(identity.is(id));
        assert_eq!(identity.user().map(User::profile_url).as_deref(), Some("/profile/leo/"));
        assert!(!Identity::Anonymous.is(id));
    }
}
