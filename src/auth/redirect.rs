//! Where to send the caller around the login page.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// `next` if it is a same-origin relative path, otherwise `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    // "//host" and "/\host" are treated as network-path references by browsers
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(|c| c.is_control())
}

/// Login page URL that returns to `path_and_query` afterwards.
pub fn login_url(path_and_query: &str) -> String {
    format!("/login?next={}", urlencoding::encode(path_and_query))
}

/// Login page URL keeping an existing `next`, if any.
pub fn login_url_with(next: Option<&str>) -> String {
    match next {
        Some(next) if !next.is_empty() => login_url(next),
        _ => "/login".into(),
    }
}
