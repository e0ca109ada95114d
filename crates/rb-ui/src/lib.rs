//! # rb-ui
//!
//! askama templates for every page. Each page struct borrows the engine's
//! view data; `render` turns a template into HTML or an `AppError`.

use askama::Template;
use rb_core::error::{AppError, FieldErrors, Result};
use rb_core::forms::{LoginForm, SignupForm};
use rb_core::models::{Group, Identity, PostView};
use rb_core::pagination::Page;
use rb_core::{PostDetail, PostFormView, ProfileFeed};

/// Renders any page, mapping template failures to `AppError::Internal`.
pub fn render<T: Template>(template: &T) -> Result<String> {
    template
        .render()
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")))
}

mod filters {
    /// Escapes HTML and turns newlines into `<br>`. Output must be marked `safe`.
    /// Named apart from askama's own `linebreaksbr`, which does not escape.
    pub fn escape_linebreaks<T: std::fmt::Display>(text: T) -> ::askama::Result<String> {
        let escaped = html_escape::encode_safe(&text.to_string()).to_string();
        Ok(escaped.replace("\r\n", "\n").replace('\n', "<br>"))
    }
}

/// The post list plus paginator of the global feed; cached separately from
/// the page around it.
#[derive(Template)]
#[template(path = "includes/feed.html")]
pub struct FeedFragment<'a> {
    pub page: &'a Page<PostView>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub viewer: &'a Identity,
    /// Pre-rendered `FeedFragment`
    pub feed: &'a str,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate<'a> {
    pub viewer: &'a Identity,
    pub group: &'a Group,
    pub page: &'a Page<PostView>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub viewer: &'a Identity,
    pub profile: &'a ProfileFeed,
    pub page: &'a Page<PostView>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate<'a> {
    pub viewer: &'a Identity,
    pub page: &'a Page<PostView>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate<'a> {
    pub viewer: &'a Identity,
    pub detail: &'a PostDetail,
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate<'a> {
    pub viewer: &'a Identity,
    pub view: &'a PostFormView,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub viewer: &'a Identity,
    pub form: &'a LoginForm,
    pub errors: &'a FieldErrors,
    /// Where to continue after a successful login
    pub next: &'a str,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate<'a> {
    pub viewer: &'a Identity,
    pub form: &'a SignupForm,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate<'a> {
    pub viewer: &'a Identity,
    pub path: &'a str,
}
