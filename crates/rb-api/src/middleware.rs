//! Middleware for security, logging, and traffic control.

use actix_cors::Cors;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlerResponse, ErrorHandlers, Logger};
use actix_web::{FromRequest, HttpResponse};
use rb_ui::NotFoundTemplate;

use crate::auth::Viewer;
use crate::error::ApiError;

/// Access log: remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// Every page is either a GET or a form POST.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600)
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}

/// Replaces every 404 body with the site's page, drawn for the requester and
/// naming the requested path. Covers unmatched routes, unparsable path
/// segments and lookups that found nothing.
pub fn not_found_page<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::NOT_FOUND, render_not_found)
}

fn render_not_found<B: 'static>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    Ok(ErrorHandlerResponse::Future(Box::pin(async move {
        let viewer = match Viewer::extract(&req).await {
            Ok(Viewer(viewer)) => viewer,
            Err(err) => {
                log::warn!("drawing 404 for an anonymous viewer: {err}");
                Default::default()
            }
        };
        let page = rb_ui::render(&NotFoundTemplate { viewer: &viewer, path: req.path() }).map_err(ApiError)?;
        let res = HttpResponse::NotFound().content_type(ContentType::html()).body(page);
        Ok::<_, actix_web::Error>(ServiceResponse::new(req, res).map_into_right_body())
    })))
}
