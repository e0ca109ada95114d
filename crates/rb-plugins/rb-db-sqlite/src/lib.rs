//! # rb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rb-core` domain models.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rb_core::models::{Comment, CommentView, Follow, Group, Post, PostView, User};
use rb_core::traits::{BlogRepo, PostFilter, UserRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// Columns of a post joined with its author and optional group.
const POST_SELECT: &str = "
    SELECT p.id, p.text, p.created_at, p.author_id, p.group_id, p.image,
           u.username AS author_username, u.created_at AS author_created_at,
           g.slug AS group_slug, g.title AS group_title, g.description AS group_description
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN blog_groups g ON g.id = p.group_id";

pub struct SqliteBlogRepo {
    pool: SqlitePool,
}

impl SqliteBlogRepo {
    /// Connects (creating the database file if needed) and applies migrations.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` opens its own empty database, so
    /// in-memory pools are pinned to one connection that never idles out.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .idle_timeout(Duration::from_secs(600))
        }
        .connect_with(options)
        .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("sqlite store ready at {url}");
        Ok(Self { pool })
    }
}

/// WHERE clause and bind value for a feed filter.
fn filter_clause(filter: PostFilter) -> (&'static str, Option<Uuid>) {
    match filter {
        PostFilter::All => ("", None),
        PostFilter::Group(id) => ("WHERE p.group_id = ?", Some(id)),
        PostFilter::Author(id) => ("WHERE p.author_id = ?", Some(id)),
        PostFilter::FollowedBy(id) => (
            "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
            Some(id),
        ),
    }
}

fn row_to_post_view(row: &SqliteRow) -> anyhow::Result<PostView> {
    let author_id: Uuid = row.try_get("author_id")?;
    let group_id: Option<Uuid> = row.try_get("group_id")?;

    let group = match group_id {
        Some(id) => Some(Group {
            id,
            slug: row.try_get("group_slug")?,
            title: row.try_get("group_title")?,
            description: row.try_get("group_description")?,
        }),
        None => None,
    };

    Ok(PostView {
        post: Post {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            created_at: row.try_get("created_at")?,
            author_id,
            group_id,
            image: row.try_get("image")?,
        },
        author: User {
            id: author_id,
            username: row.try_get("author_username")?,
            created_at: row.try_get("author_created_at")?,
        },
        group,
        image_url: None,
        thumbnail_url: None,
    })
}

fn row_to_group(row: &SqliteRow) -> anyhow::Result<Group> {
    Ok(Group {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BlogRepo for SqliteBlogRepo {
    async fn create_group(&self, group: Group) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO blog_groups (id, slug, title, description) VALUES (?, ?, ?, ?)")
            .bind(group.id)
            .bind(&group.slug)
            .bind(&group.title)
            .bind(&group.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Retrieves a group by its slug.
    async fn get_group(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query("SELECT id, slug, title, description FROM blog_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_group).transpose()
    }

    async fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        sqlx::query("SELECT id, slug, title, description FROM blog_groups ORDER BY title, slug")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_group)
            .collect()
    }

    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, text, created_at, author_id, group_id, image) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.text)
            .bind(post.created_at)
            .bind(post.author_id)
            .bind(post.group_id)
            .bind(post.image)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_post(&self, post: Post) -> anyhow::Result<()> {
        let updated = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(post.text)
            .bind(post.group_id)
            .bind(post.image)
            .bind(post.id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            anyhow::bail!("post {} vanished before update", post.id);
        }
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>> {
        let sql = format!("{POST_SELECT} WHERE p.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_post_view).transpose()
    }

    /// Comments go with the post through `ON DELETE CASCADE`.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> anyhow::Result<i64> {
        let (clause, key) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM posts p {clause}");
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(key) = key {
            query = query.bind(key);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> anyhow::Result<Vec<PostView>> {
        let (clause, key) = filter_clause(filter);
        let sql = format!("{POST_SELECT} {clause} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?");
        let mut query = sqlx::query(&sql);
        if let Some(key) = key {
            query = query.bind(key);
        }
        query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_post_view)
            .collect()
    }

    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO comments (id, post_id, author_id, text, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(comment.author_id)
            .bind(comment.text)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created_at,
                    u.username AS author_username, u.created_at AS author_created_at
             FROM comments c JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let author_id: Uuid = row.try_get("author_id")?;
                Ok(CommentView {
                    comment: Comment {
                        id: row.try_get("id")?,
                        post_id: row.try_get("post_id")?,
                        author_id,
                        text: row.try_get("text")?,
                        created_at: row.try_get("created_at")?,
                    },
                    author: User {
                        id: author_id,
                        username: row.try_get("author_username")?,
                        created_at: row.try_get("author_created_at")?,
                    },
                })
            })
            .collect()
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found > 0)
    }

    /// Idempotent insert; returns true if a new row was written.
    async fn create_follow(&self, follow: Follow) -> anyhow::Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO follows (id, user_id, author_id) VALUES (?, ?, ?)
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(follow.id)
        .bind(follow.user_id)
        .bind(follow.author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteBlogRepo {
    async fn create_user(&self, user: User, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&user.username)
            .bind(password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_credentials(&self, username: &str) -> anyhow::Result<Option<(User, String)>> {
        let row = sqlx::query("SELECT id, username, created_at, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some((row_to_user(&row)?, row.try_get("password_hash")?))),
            None => Ok(None),
        }
    }

    async fn create_session(&self, token_digest: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO sessions (token_digest, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token_digest)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_session_user(&self, token_digest: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.created_at
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token_digest = ? AND s.expires_at > ?",
        )
        .bind(token_digest)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn repo() -> SqliteBlogRepo {
        SqliteBlogRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn user(repo: &SqliteBlogRepo, name: &str) -> User {
        let user = User::new(name);
        repo.create_user(user.clone(), "hash").await.unwrap();
        user
    }

    async fn post(repo: &SqliteBlogRepo, author: &User, text: &str, group: Option<&Group>) -> Post {
        let post = Post::new(author.id, text, group.map(|g| g.id), None);
        repo.create_post(post.clone()).await.unwrap();
        post
    }

    #[tokio::test]
    async fn test_post_round_trip_with_group() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        let group = Group::new("g1", "Group 1", "first");
        repo.create_group(group.clone()).await.unwrap();

        let created = post(&repo, &author, "hello", Some(&group)).await;
        let view = repo.get_post(created.id).await.unwrap().expect("post exists");
        assert_eq!(view.post.text, "hello");
        assert_eq!(view.author.username, "author");
        assert_eq!(view.group, Some(group));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        let first = post(&repo, &author, "first", None).await;
        let second = post(&repo, &author, "second", None).await;

        let ids: Vec<Uuid> = repo
            .list_posts(PostFilter::All, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.post.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_filters() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let carol = user(&repo, "carol").await;
        let g1 = Group::new("g1", "One", "");
        let g2 = Group::new("g2", "Two", "");
        repo.create_group(g1.clone()).await.unwrap();
        repo.create_group(g2.clone()).await.unwrap();

        post(&repo, &alice, "a1", Some(&g1)).await;
        post(&repo, &bob, "b1", None).await;
        post(&repo, &bob, "b2", Some(&g1)).await;
        repo.create_follow(Follow::new(carol.id, bob.id)).await.unwrap();

        assert_eq!(repo.count_posts(PostFilter::All).await.unwrap(), 3);
        assert_eq!(repo.count_posts(PostFilter::Group(g1.id)).await.unwrap(), 2);
        assert_eq!(repo.count_posts(PostFilter::Group(g2.id)).await.unwrap(), 0);
        assert_eq!(repo.count_posts(PostFilter::Author(bob.id)).await.unwrap(), 2);
        assert_eq!(repo.count_posts(PostFilter::FollowedBy(carol.id)).await.unwrap(), 2);
        assert_eq!(repo.count_posts(PostFilter::FollowedBy(alice.id)).await.unwrap(), 0);

        let followed = repo.list_posts(PostFilter::FollowedBy(carol.id), 10, 0).await.unwrap();
        assert!(followed.iter().all(|v| v.author.id == bob.id));
    }

    #[tokio::test]
    async fn test_limit_and_offset() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        for i in 0..5 {
            post(&repo, &author, &format!("post {i}"), None).await;
        }
        let page = repo.list_posts(PostFilter::All, 2, 4).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].post.text, "post 0");
    }

    #[tokio::test]
    async fn test_follow_edge_is_unique() {
        let repo = repo().await;
        let a = user(&repo, "a").await;
        let b = user(&repo, "b").await;

        assert!(repo.create_follow(Follow::new(a.id, b.id)).await.unwrap());
        assert!(!repo.create_follow(Follow::new(a.id, b.id)).await.unwrap());
        assert!(repo.follow_exists(a.id, b.id).await.unwrap());
        assert!(!repo.follow_exists(b.id, a.id).await.unwrap());

        assert!(repo.delete_follow(a.id, b.id).await.unwrap());
        assert!(!repo.delete_follow(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_rejected_by_schema() {
        let repo = repo().await;
        let a = user(&repo, "a").await;
        assert!(repo.create_follow(Follow::new(a.id, a.id)).await.is_err());
    }

    #[tokio::test]
    async fn test_cascades() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        let reader = user(&repo, "reader").await;
        let kept = post(&repo, &author, "kept", None).await;
        let doomed = post(&repo, &author, "doomed", None).await;
        repo.create_comment(Comment::new(doomed.id, reader.id, "nice")).await.unwrap();
        repo.create_comment(Comment::new(kept.id, reader.id, "also nice")).await.unwrap();

        assert!(repo.delete_post(doomed.id).await.unwrap());
        assert!(repo.list_comments(doomed.id).await.unwrap().is_empty());
        assert_eq!(repo.list_comments(kept.id).await.unwrap().len(), 1);

        // Deleting the author takes their posts along.
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(author.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        assert!(repo.get_post(kept.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_group_delete_detaches_posts() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        let group = Group::new("g", "G", "");
        repo.create_group(group.clone()).await.unwrap();
        let p = post(&repo, &author, "grouped", Some(&group)).await;

        sqlx::query("DELETE FROM blog_groups WHERE id = ?")
            .bind(group.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        let view = repo.get_post(p.id).await.unwrap().expect("post survives");
        assert_eq!(view.group, None);
    }

    #[tokio::test]
    async fn test_update_post() {
        let repo = repo().await;
        let author = user(&repo, "author").await;
        let mut p = post(&repo, &author, "before", None).await;
        p.text = "after".into();
        p.image = Some("posts/aa/bb/x.png".into());
        repo.update_post(p.clone()).await.unwrap();

        let view = repo.get_post(p.id).await.unwrap().unwrap();
        assert_eq!(view.post.text, "after");
        assert_eq!(view.post.image.as_deref(), Some("posts/aa/bb/x.png"));
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let repo = repo().await;
        user(&repo, "same").await;
        assert!(repo.create_user(User::new("same"), "hash").await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let repo = repo().await;
        let u = user(&repo, "u").await;
        repo.create_session("live", u.id, Utc::now() + Duration::days(1)).await.unwrap();
        repo.create_session("stale", u.id, Utc::now() - Duration::days(1)).await.unwrap();

        assert_eq!(repo.get_session_user("live").await.unwrap(), Some(u.clone()));
        assert_eq!(repo.get_session_user("stale").await.unwrap(), None);

        repo.delete_session("live").await.unwrap();
        assert_eq!(repo.get_session_user("live").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credentials() {
        let repo = repo().await;
        let u = user(&repo, "u").await;
        let (found, hash) = repo.get_credentials("u").await.unwrap().unwrap();
        assert_eq!(found.id, u.id);
        assert_eq!(hash, "hash");
        assert!(repo.get_credentials("nobody").await.unwrap().is_none());
    }
}
