//! Canonical paths of the public routes. Redirects build on these directly;
//! templates reach them through the link methods on the models.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

/// Characters escaped in a `next` query value; `/` stays readable.
const NEXT_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn index() -> String {
    "/".to_string()
}

pub fn group(slug: &str) -> String {
    format!("/group/{slug}/")
}

pub fn profile(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn profile_follow(username: &str) -> String {
    format!("/profile/{username}/follow/")
}

pub fn profile_unfollow(username: &str) -> String {
    format!("/profile/{username}/unfollow/")
}

pub fn post_detail(id: Uuid) -> String {
    format!("/posts/{id}/")
}

pub fn post_edit(id: Uuid) -> String {
    format!("/posts/{id}/edit/")
}

pub fn add_comment(id: Uuid) -> String {
    format!("/posts/{id}/comment/")
}

pub fn post_create() -> String {
    "/create/".to_string()
}

/// `login_url?next=<target>`, with the target escaped so its own query
/// string survives the round trip.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    format!("{login_url}?next={}", utf8_percent_encode(next, NEXT_VALUE_SET))
}

/// True for paths that stay on this site (`/x`, not `//host` or `http://`).
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}
