//! Reading and building the session and flash cookies.

use axum::http::{header::COOKIE, HeaderMap};
use cookie::{Cookie, SameSite};
use time::Duration;

/// Value of the first cookie called `name` across all `Cookie` headers, with any
/// surrounding double quotes removed.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| Cookie::split_parse(v))
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value_trimmed().to_string())
}

/// HttpOnly, SameSite=Lax cookie on `/`. `max_age` of `None` makes a browser-session cookie.
pub fn build(name: &str, value: &str, max_age: Option<Duration>, secure: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

/// Same attributes as [`build`], expired so the browser drops it.
pub fn removal(name: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = build(name, "", None, secure);
    cookie.make_removal();
    cookie
}
