//! HTML pages. Every user-controlled string goes through [`escape`].

use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use time::format_description::well_known::Rfc3339;

use crate::{
    auth::extractors::Identity, flash::Flashes, forms::FormErrors, posts::repo_types::FeedEntry,
    users::repo_types::User,
};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full page around `content`. Pending flashes are shown here and cleared.
pub fn render(
    status: StatusCode,
    title: &str,
    identity: &Identity,
    flashes: Flashes,
    content: &str,
) -> Response {
    let (messages, clear) = flashes.take();
    let nav = match identity.user() {
        Some(user) => format!(
            r#"<a href="/index">Home</a> <a href="/user/{name}">Profile</a> <a href="/logout">Logout</a>"#,
            name = urlencoding::encode(&user.username)
        ),
        None => r#"<a href="/index">Home</a> <a href="/login">Login</a>"#.to_string(),
    };
    let flash_list = if messages.is_empty() {
        String::new()
    } else {
        let items: String = messages
            .iter()
            .map(|m| format!("<li>{}</li>", escape(m)))
            .collect();
        format!(r#"<ul class="flashes">{items}</ul>"#)
    };
    let html = format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title} - Microblog</title></head>\
         <body><nav>Microblog: {nav}</nav><hr>{flash_list}{content}</body></html>",
        title = escape(title),
    );
    let headers: Vec<_> = clear.into_iter().map(|c| (SET_COOKIE, c)).collect();
    (status, AppendHeaders(headers), Html(html)).into_response()
}

fn input(label: &str, name: &str, kind: &str, value: &str, errors: &FormErrors) -> String {
    let error = errors
        .get(name)
        .map(|e| format!(r#" <span class="error">[{}]</span>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<p>{label}<br><input type="{kind}" name="{name}" value="{value}">{error}</p>"#,
        value = escape(value),
    )
}

fn post_list(posts: &[FeedEntry]) -> String {
    posts
        .iter()
        .map(|p| {
            format!(
                "<div class=\"post\"><p>{} says: <b>{}</b></p></div>",
                escape(&p.author),
                escape(&p.post.body)
            )
        })
        .collect()
}

pub fn index(user: &User, posts: &[FeedEntry]) -> String {
    format!(
        "<h1>Hi, {}!</h1>{}",
        escape(&user.username),
        post_list(posts)
    )
}

pub fn login(username: &str, remember: bool, errors: &FormErrors, next: Option<&str>) -> String {
    let action = match next {
        Some(n) if !n.is_empty() => format!("/login?next={}", urlencoding::encode(n)),
        _ => "/login".into(),
    };
    format!(
        r#"<h1>Sign In</h1><form action="{action}" method="post">{username}{password}<p><input type="checkbox" name="remember_me" value="y"{checked}> Remember Me</p><p><input type="submit" value="Sign In"></p></form><p>New User? <a href="/register">Click to Register!</a></p>"#,
        action = escape(&action),
        username = input("Username", "username", "text", username, errors),
        password = input("Password", "password", "password", "", errors),
        checked = if remember { " checked" } else { "" },
    )
}

pub fn register(username: &str, email: &str, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Register</h1><form action="/register" method="post">{}{}{}{}<p><input type="submit" value="Register"></p></form>"#,
        input("Username", "username", "text", username, errors),
        input("Email", "email", "text", email, errors),
        input("Password", "password", "password", "", errors),
        input("Repeat Password", "password2", "password", "", errors),
    )
}

pub fn user_profile(user: &User, is_self: bool, posts: &[FeedEntry]) -> String {
    let about = user
        .about_me
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| format!("<p>{}</p>", escape(a)))
        .unwrap_or_default();
    let last_seen = user
        .last_seen
        .format(&Rfc3339)
        .map(|ts| format!("<p>Last seen on: {ts}</p>"))
        .unwrap_or_default();
    let edit = if is_self {
        r#"<p><a href="/edit_profile">Edit your profile</a></p>"#
    } else {
        ""
    };
    format!(
        r#"<table><tr><td><img src="{avatar}"></td><td><h1>User: {name}</h1>{about}{last_seen}{edit}</td></tr></table><hr>{posts}"#,
        avatar = escape(&user.avatar(128)),
        name = escape(&user.username),
        posts = post_list(posts),
    )
}

pub fn edit_profile(username: &str, about_me: &str, errors: &FormErrors) -> String {
    let about_error = errors
        .get("about_me")
        .map(|e| format!(r#" <span class="error">[{}]</span>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<h1>Edit Profile</h1><form action="/edit_profile" method="post">{}<p>About me<br><textarea name="about_me" rows="4" cols="50">{}</textarea>{}</p><p><input type="submit" value="Submit"></p></form>"#,
        input("Username", "username", "text", username, errors),
        escape(about_me),
        about_error,
    )
}

pub fn not_found() -> String {
    r#"<h1>File Not Found</h1><p><a href="/index">Back</a></p>"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn form_errors_are_rendered_next_to_fields() {
        let mut errors = FormErrors::default();
        errors.insert("username", "Please use a different username.");
        let html = register("<b>bob</b>", "bob@example.com", &errors);
        assert!(html.contains("[Please use a different username.]"));
        assert!(html.contains("&lt;b&gt;bob&lt;/b&gt;"));
        assert!(!html.contains("<b>bob</b>"));
    }

    #[test]
    fn login_form_keeps_next_in_action() {
        let html = login("", false, &FormErrors::default(), Some("/user/susan"));
        assert!(html.contains(r#"action="/login?next=%2Fuser%2Fsusan""#));
    }

    #[tokio::test]
    async fn render_shows_nav_for_anonymous() {
        let resp = render(
            StatusCode::OK,
            "Home",
            &Identity::Anonymous,
            Flashes::default(),
            "<p>x</p>",
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(SET_COOKIE).is_none());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Home - Microblog</title>"));
        assert!(html.contains(r#"<a href="/login">Login</a>"#));
    }
}
