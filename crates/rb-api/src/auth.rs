//! Session cookie handling: the `Viewer` extractor plus the signup, login and
//! logout endpoints.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use rb_core::accounts::SESSION_TTL_DAYS;
use rb_core::error::{AppError, FieldErrors};
use rb_core::forms::{LoginForm, SignupForm};
use rb_core::models::Identity;
use rb_core::urls;
use rb_ui::{LoginTemplate, SignupTemplate};
use serde::Deserialize;

use crate::error::ApiError;
use crate::{html, AppState};

pub const SESSION_COOKIE: &str = "sessionid";

/// The requester, resolved from the session cookie. Never fails for a bad or
/// expired cookie; that is simply an anonymous viewer.
pub struct Viewer(pub Identity);

impl FromRequest for Viewer {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::Internal("application state is not registered".into()))?;
            Ok(Viewer(state.accounts.resolve(token.as_deref()).await?))
        })
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .finish()
}

fn expired_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Only same-site paths are followed after login.
fn continue_to(next: &str) -> String {
    if urls::is_local_path(next) {
        next.to_string()
    } else {
        urls::index()
    }
}

fn signed_in(token: String, location: &str) -> HttpResponse {
    HttpResponse::Found()
        .cookie(session_cookie(token))
        .insert_header((header::LOCATION, location))
        .finish()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginSubmission {
    pub username: String,
    pub password: String,
    pub next: String,
}

pub async fn login_form(Viewer(viewer): Viewer, query: web::Query<NextQuery>) -> Result<HttpResponse, ApiError> {
    let page = rb_ui::render(&LoginTemplate {
        viewer: &viewer,
        form: &LoginForm::default(),
        errors: &FieldErrors::new(),
        next: &query.next,
    })?;
    Ok(html(page))
}

pub async fn login(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    web::Form(submission): web::Form<LoginSubmission>,
) -> Result<HttpResponse, ApiError> {
    let form = LoginForm {
        username: submission.username,
        password: submission.password,
    };
    match state.accounts.login(&form).await? {
        Ok(session) => Ok(signed_in(session.token, &continue_to(&submission.next))),
        Err(errors) => {
            let form = LoginForm { password: String::new(), ..form };
            let page = rb_ui::render(&LoginTemplate {
                viewer: &viewer,
                form: &form,
                errors: &errors,
                next: &submission.next,
            })?;
            Ok(html(page))
        }
    }
}

pub async fn signup_form(Viewer(viewer): Viewer) -> Result<HttpResponse, ApiError> {
    let page = rb_ui::render(&SignupTemplate {
        viewer: &viewer,
        form: &SignupForm::default(),
        errors: &FieldErrors::new(),
    })?;
    Ok(html(page))
}

pub async fn signup(
    state: web::Data<AppState>,
    Viewer(viewer): Viewer,
    web::Form(form): web::Form<SignupForm>,
) -> Result<HttpResponse, ApiError> {
    match state.accounts.signup(&form).await? {
        Ok(session) => Ok(signed_in(session.token, &urls::index())),
        Err(errors) => {
            let form = SignupForm {
                username: form.username,
                ..SignupForm::default()
            };
            let page = rb_ui::render(&SignupTemplate {
                viewer: &viewer,
                form: &form,
                errors: &errors,
            })?;
            Ok(html(page))
        }
    }
}

pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    state.accounts.logout(token.as_deref()).await?;
    Ok(HttpResponse::Found()
        .cookie(expired_cookie())
        .insert_header((header::LOCATION, urls::index()))
        .finish())
}
