//! # Access/Visibility Engine
//!
//! Decides, per requester, which posts a listing shows and whether a
//! mutation (create/edit post, comment, follow, unfollow) may proceed.
//! Every operation is a single read-modify step; the HTTP layer turns the
//! returned [`Outcome`] into a page or a redirect.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, FieldErrors, Result};
use crate::forms::{CleanPost, CommentForm, PostForm, INVALID_IMAGE};
use crate::models::{Comment, CommentView, Follow, Group, Identity, Post, PostView, User};
use crate::pagination::{Page, Paginator};
use crate::traits::{BlogRepo, MediaStore, PageCache, PostFilter, UserRepo};
use crate::urls;

/// Engine-facing configuration.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub page_size: usize,
    /// Clear the page cache after every post write instead of waiting for expiry
    pub invalidate_cache_on_write: bool,
    pub max_upload_bytes: usize,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            invalidate_cache_on_write: false,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Result of an operation that may render, redirect or refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Show a page built from `T`
    Render(T),
    /// The operation finished; continue at this path
    Redirect(String),
    /// The requester may not do this; continue at this path without changes
    Denied(String),
    /// Anonymous requester on an authenticated-only operation
    LoginRequired,
}

#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<PostView>,
    /// Requester is authenticated, is not the author, and follows them
    pub following: bool,
    /// Requester is the author themself
    pub is_self: bool,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    pub author_post_count: i64,
    pub can_edit: bool,
}

/// State of the create/edit form.
#[derive(Debug, Clone)]
pub struct PostFormView {
    pub form: PostForm,
    pub errors: FieldErrors,
    pub groups: Vec<Group>,
    /// The post being edited; `None` when creating
    pub editing: Option<PostView>,
}

impl PostFormView {
    pub fn edited_post(&self) -> Option<&PostView> {
        self.editing.as_ref()
    }

    /// Where the form submits to.
    pub fn action(&self) -> String {
        match &self.editing {
            Some(view) => urls::post_edit(view.post.id),
            None => urls::post_create(),
        }
    }
}

pub struct Blog {
    repo: Arc<dyn BlogRepo>,
    users: Arc<dyn UserRepo>,
    media: Arc<dyn MediaStore>,
    cache: Arc<dyn PageCache>,
    settings: BlogSettings,
    paginator: Paginator,
}

impl Blog {
    pub fn new(
        repo: Arc<dyn BlogRepo>,
        users: Arc<dyn UserRepo>,
        media: Arc<dyn MediaStore>,
        cache: Arc<dyn PageCache>,
        settings: BlogSettings,
    ) -> Self {
        let paginator = Paginator::new(settings.page_size);
        Self { repo, users, media, cache, settings, paginator }
    }

    pub fn settings(&self) -> &BlogSettings {
        &self.settings
    }

    /// The global feed: every post, newest first. Open to everyone.
    pub async fn index(&self, page: Option<&str>) -> Result<Page<PostView>> {
        self.feed(PostFilter::All, page).await
    }

    /// The global feed rendered through `render`, served from the page cache
    /// while a fresh entry exists for `key`.
    pub async fn cached_index<F>(&self, key: &str, page: Option<&str>, render: F) -> Result<String>
    where
        F: FnOnce(&Page<PostView>) -> Result<String>,
    {
        if let Some(hit) = self.cache.get(key).await {
            log::debug!("page cache hit for {key}");
            return Ok(hit);
        }
        log::debug!("page cache miss for {key}");
        let rendered = render(&self.index(page).await?)?;
        self.cache.insert(key.to_string(), rendered.clone()).await;
        Ok(rendered)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed> {
        let group = self
            .repo
            .get_group(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Group", slug))?;
        let page = self.feed(PostFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile_feed(&self, viewer: &Identity, username: &str, page: Option<&str>) -> Result<ProfileFeed> {
        let author = self.find_user(username).await?;
        let page = self.feed(PostFilter::Author(author.id), page).await?;
        let is_self = viewer.is(author.id);
        let following = match viewer.user() {
            Some(user) if !is_self => self.repo.follow_exists(user.id, author.id).await?,
            _ => false,
        };
        Ok(ProfileFeed { author, page, following, is_self })
    }

    /// Posts by authors the requester follows.
    pub async fn follow_feed(&self, viewer: &Identity, page: Option<&str>) -> Result<Outcome<Page<PostView>>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let page = self.feed(PostFilter::FollowedBy(user.id), page).await?;
        Ok(Outcome::Render(page))
    }

    pub async fn post_detail(&self, viewer: &Identity, id: Uuid) -> Result<PostDetail> {
        let post = self.find_post(id).await?;
        let comments = self.repo.list_comments(id).await?;
        let author_post_count = self.repo.count_posts(PostFilter::Author(post.author.id)).await?;
        Ok(PostDetail {
            can_edit: viewer.is(post.author.id),
            post,
            comments,
            form: CommentForm::default(),
            author_post_count,
        })
    }

    /// Empty create form.
    pub async fn new_post_form(&self, viewer: &Identity) -> Result<Outcome<PostFormView>> {
        if !viewer.is_authenticated() {
            return Ok(Outcome::LoginRequired);
        }
        Ok(Outcome::Render(self.form_view(PostForm::default(), FieldErrors::new(), None).await?))
    }

    /// Publishes a post as the requester; on success continues at their profile.
    pub async fn create_post(&self, viewer: &Identity, form: PostForm) -> Result<Outcome<PostFormView>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };

        let clean = match self.clean_post(&form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(Outcome::Render(self.form_view(form, errors, None).await?)),
        };
        let image = match self.store_image(&clean).await? {
            Ok(image) => image,
            Err(errors) => return Ok(Outcome::Render(self.form_view(form, errors, None).await?)),
        };

        let post = Post::new(user.id, &clean.text, clean.group_id, image);
        log::info!("{} published post {}", user.username, post.id);
        self.repo.create_post(post).await?;
        self.after_write().await;

        Ok(Outcome::Redirect(urls::profile(&user.username)))
    }

    /// Edit form prefilled from the post. Non-authors are sent back to the post.
    pub async fn edit_post_form(&self, viewer: &Identity, id: Uuid) -> Result<Outcome<PostFormView>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let post = self.find_post(id).await?;
        if post.author.id != user.id {
            return Ok(Outcome::Denied(urls::post_detail(id)));
        }
        let form = PostForm::from_post(&post.post.text, post.post.group_id);
        Ok(Outcome::Render(self.form_view(form, FieldErrors::new(), Some(post)).await?))
    }

    /// Applies an edit. Anyone but the author gets `Denied` and the post stays untouched.
    pub async fn edit_post(&self, viewer: &Identity, id: Uuid, form: PostForm) -> Result<Outcome<PostFormView>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let current = self.find_post(id).await?;
        if current.author.id != user.id {
            log::warn!("{} attempted to edit post {} by {}", user.username, id, current.author.username);
            return Ok(Outcome::Denied(urls::post_detail(id)));
        }

        let clean = match self.clean_post(&form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(Outcome::Render(self.form_view(form, errors, Some(current)).await?)),
        };
        let uploaded = match self.store_image(&clean).await? {
            Ok(image) => image,
            Err(errors) => return Ok(Outcome::Render(self.form_view(form, errors, Some(current)).await?)),
        };

        let mut post = current.post;
        post.text = clean.text;
        post.group_id = clean.group_id;
        post.image = match (uploaded, clean.clear_image) {
            (Some(image), _) => Some(image),
            (None, true) => None,
            (None, false) => post.image,
        };
        log::info!("{} edited post {}", user.username, id);
        self.repo.update_post(post).await?;
        self.after_write().await;

        Ok(Outcome::Redirect(urls::post_detail(id)))
    }

    /// Attaches a comment. Invalid input is dropped; either way the requester
    /// lands back on the post.
    pub async fn add_comment(&self, viewer: &Identity, post_id: Uuid, form: CommentForm) -> Result<Outcome<()>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let post = self.find_post(post_id).await?;
        if let Ok(text) = form.validate() {
            let comment = Comment::new(post.post.id, user.id, &text);
            log::info!("{} commented on post {}", user.username, post_id);
            self.repo.create_comment(comment).await?;
        }
        Ok(Outcome::Redirect(urls::post_detail(post_id)))
    }

    /// Creates the (requester, author) edge unless it is a self-follow or
    /// already exists.
    pub async fn follow(&self, viewer: &Identity, username: &str) -> Result<Outcome<()>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let author = self.find_user(username).await?;
        if author.id != user.id && !self.repo.follow_exists(user.id, author.id).await? {
            if self.repo.create_follow(Follow::new(user.id, author.id)).await? {
                log::info!("{} now follows {}", user.username, author.username);
            }
        }
        Ok(Outcome::Redirect(urls::profile(&author.username)))
    }

    /// Removes the (requester, author) edge; a missing edge is `NotFound`.
    pub async fn unfollow(&self, viewer: &Identity, username: &str) -> Result<Outcome<()>> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::LoginRequired);
        };
        let author = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("Follow", format!("{}->{}", user.username, username)))?;
        if !self.repo.delete_follow(user.id, author.id).await? {
            return Err(AppError::not_found("Follow", format!("{}->{}", user.username, username)));
        }
        log::info!("{} unfollowed {}", user.username, author.username);
        Ok(Outcome::Redirect(urls::profile(username)))
    }

    async fn feed(&self, filter: PostFilter, page: Option<&str>) -> Result<Page<PostView>> {
        let count = self.repo.count_posts(filter).await?;
        let slot = self.paginator.locate(count, page);
        let items = self
            .repo
            .list_posts(filter, slot.limit, slot.offset)
            .await?
            .into_iter()
            .map(|view| self.with_media_urls(view))
            .collect();
        Ok(Page::new(items, slot, count))
    }

    async fn find_user(&self, username: &str) -> Result<User> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User", username))
    }

    async fn find_post(&self, id: Uuid) -> Result<PostView> {
        self.repo
            .get_post(id)
            .await?
            .map(|view| self.with_media_urls(view))
            .ok_or_else(|| AppError::not_found("Post", id))
    }

    async fn clean_post(&self, form: &PostForm) -> Result<std::result::Result<CleanPost, FieldErrors>> {
        let groups = self.repo.list_groups().await?;
        Ok(form.validate(&groups, self.settings.max_upload_bytes))
    }

    /// Persists the upload, if any. A file that is not an image becomes a
    /// field error rather than a failure.
    async fn store_image(&self, clean: &CleanPost) -> Result<std::result::Result<Option<String>, FieldErrors>> {
        let Some(upload) = &clean.image else {
            return Ok(Ok(None));
        };
        match self.media.save_upload(upload.data.clone(), &upload.filename).await {
            Ok(media_id) => Ok(Ok(Some(media_id))),
            Err(AppError::ValidationError(reason)) => {
                log::debug!("rejected upload {}: {reason}", upload.filename);
                let mut errors = FieldErrors::new();
                errors.add("image", INVALID_IMAGE);
                Ok(Err(errors))
            }
            Err(err) => Err(err),
        }
    }

    async fn form_view(&self, form: PostForm, errors: FieldErrors, editing: Option<PostView>) -> Result<PostFormView> {
        let groups = self.repo.list_groups().await?;
        Ok(PostFormView { form, errors, groups, editing })
    }

    fn with_media_urls(&self, mut view: PostView) -> PostView {
        if let Some(image) = &view.post.image {
            view.image_url = Some(self.media.url(image));
            view.thumbnail_url = Some(self.media.thumbnail_url(image));
        }
        view
    }

    async fn after_write(&self) {
        if self.settings.invalidate_cache_on_write {
            self.cache.clear().await;
        }
    }
}
