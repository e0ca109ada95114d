//! # rb-api
//!
//! The web routing and orchestration layer for Rusty-Blog.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;

use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse};
use rb_core::{Accounts, Blog};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub blog: Blog,
    pub accounts: Accounts,
    /// Where `LoginRequired` outcomes are sent, with `?next=`.
    pub login_url: String,
}

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

pub(crate) fn found(location: &str) -> HttpResponse {
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}

/// Configures the routes for the blog.
///
/// The binary mounts this at the root and sets `handlers::not_found` as the
/// default service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/group/{slug}/", web::get().to(handlers::group_posts))
        .route("/profile/{username}/", web::get().to(handlers::profile))
        .route("/profile/{username}/follow/", web::get().to(handlers::profile_follow))
        .route("/profile/{username}/unfollow/", web::get().to(handlers::profile_unfollow))
        .service(
            web::resource("/create/")
                .route(web::get().to(handlers::post_create_form))
                .route(web::post().to(handlers::post_create)),
        )
        .route("/posts/{post_id}/", web::get().to(handlers::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(handlers::post_edit_form))
                .route(web::post().to(handlers::post_edit)),
        )
        .route("/posts/{post_id}/comment/", web::post().to(handlers::add_comment))
        .route("/follow/", web::get().to(handlers::follow_index))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                ),
        );
}
