//! # rb-api Handlers
//!
//! Thin adapters between HTTP requests and the `Blog` engine: extract the
//! viewer and parameters, call the engine, render the outcome.

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use rb_core::blog::Outcome;
use rb_core::error::AppError;
use rb_core::forms::CommentForm;
use rb_core::urls;
use rb_ui::{
    FeedFragment, FollowTemplate, GroupTemplate, IndexTemplate, PostDetailTemplate, PostFormTemplate,
    ProfileTemplate,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::error::ApiError;
use crate::multipart::read_post_form;
use crate::{found, html, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Path plus query string, as used for cache keys and `next` targets.
fn full_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

/// Turns the non-render outcomes into redirects; `render` handles the rest.
fn respond<T>(
    outcome: Outcome<T>,
    state: &AppState,
    req: &HttpRequest,
    render: impl FnOnce(T) -> Result<HttpResponse, ApiError>,
) -> Result<HttpResponse, ApiError> {
    match outcome {
        Outcome::Render(value) => render(value),
        Outcome::Redirect(to) | Outcome::Denied(to) => Ok(found(&to)),
        Outcome::LoginRequired => Ok(login_required(state, req)),
    }
}

fn login_required(state: &AppState, req: &HttpRequest) -> HttpResponse {
    found(&urls::login_redirect(&state.login_url, &full_path(req)))
}

pub async fn index(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let feed = state
        .blog
        .cached_index(&full_path(&req), query.page.as_deref(), |page| {
            rb_ui::render(&FeedFragment { page })
        })
        .await?;
    Ok(html(rb_ui::render(&IndexTemplate { viewer: &viewer, feed: &feed })?))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let feed = state.blog.group_feed(&slug, query.page.as_deref()).await?;
    Ok(html(rb_ui::render(&GroupTemplate {
        viewer: &viewer,
        group: &feed.group,
        page: &feed.page,
    })?))
}

pub async fn profile(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let feed = state.blog.profile_feed(&viewer, &username, query.page.as_deref()).await?;
    Ok(html(rb_ui::render(&ProfileTemplate {
        viewer: &viewer,
        profile: &feed,
        page: &feed.page,
    })?))
}

pub async fn post_detail(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let detail = state.blog.post_detail(&viewer, *post_id).await?;
    Ok(html(rb_ui::render(&PostDetailTemplate { viewer: &viewer, detail: &detail })?))
}

pub async fn post_create_form(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.blog.new_post_form(&viewer).await?;
    respond(outcome, &state, &req, |view| {
        Ok(html(rb_ui::render(&PostFormTemplate { viewer: &viewer, view: &view })?))
    })
}

pub async fn post_create(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    // Anonymous uploads are refused before the body is read.
    if !viewer.is_authenticated() {
        return Ok(login_required(&state, &req));
    }
    let form = read_post_form(payload, state.blog.settings().max_upload_bytes).await?;
    let outcome = state.blog.create_post(&viewer, form).await?;
    respond(outcome, &state, &req, |view| {
        Ok(html(rb_ui::render(&PostFormTemplate { viewer: &viewer, view: &view })?))
    })
}

pub async fn post_edit_form(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.blog.edit_post_form(&viewer, *post_id).await?;
    respond(outcome, &state, &req, |view| {
        Ok(html(rb_ui::render(&PostFormTemplate { viewer: &viewer, view: &view })?))
    })
}

pub async fn post_edit(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    post_id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    if !viewer.is_authenticated() {
        return Ok(login_required(&state, &req));
    }
    let form = read_post_form(payload, state.blog.settings().max_upload_bytes).await?;
    let outcome = state.blog.edit_post(&viewer, *post_id, form).await?;
    respond(outcome, &state, &req, |view| {
        Ok(html(rb_ui::render(&PostFormTemplate { viewer: &viewer, view: &view })?))
    })
}

pub async fn add_comment(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    post_id: web::Path<Uuid>,
    form: Option<web::Form<CommentForm>>,
) -> Result<HttpResponse, ApiError> {
    // A missing or unreadable body is an empty comment, refused by validation.
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let outcome = state.blog.add_comment(&viewer, *post_id, form).await?;
    respond(outcome, &state, &req, |()| Ok(found(&urls::post_detail(*post_id))))
}

pub async fn follow_index(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.blog.follow_feed(&viewer, query.page.as_deref()).await?;
    respond(outcome, &state, &req, |page| {
        Ok(html(rb_ui::render(&FollowTemplate { viewer: &viewer, page: &page })?))
    })
}

pub async fn profile_follow(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.blog.follow(&viewer, &username).await?;
    respond(outcome, &state, &req, |()| Ok(found(&urls::profile(&username))))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    req: HttpRequest,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state.blog.unfollow(&viewer, &username).await?;
    respond(outcome, &state, &req, |()| Ok(found(&urls::profile(&username))))
}

/// Fallback for every unmatched path. The page is drawn by
/// `middleware::not_found_page`, like every other 404.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(AppError::not_found("Page", req.path()).into())
}
