use axum::{http::StatusCode, response::Response};
use time::OffsetDateTime;
use tracing::instrument;

use super::repo_types::{FeedEntry, Post};
use crate::{
    auth::extractors::{CurrentUser, Identity},
    flash::Flashes,
    users::repo_types::User,
    views,
};

fn entry(id: i64, author: &str, user_id: Option<i64>, body: &str) -> FeedEntry {
    FeedEntry {
        author: author.to_string(),
        post: Post {
            id,
            body: body.to_string(),
            timestamp: OffsetDateTime::now_utc(),
            user_id,
        },
    }
}

/// Static posts shown on the home page until posting exists.
pub fn placeholder_feed() -> Vec<FeedEntry> {
    vec![
        entry(1, "John", None, "Beautiful day in Portland!"),
        entry(2, "Susan", None, "The Avengers movie was so cool!"),
    ]
}

/// Static posts shown on `user`'s profile page.
pub fn placeholder_posts_for(user: &User) -> Vec<FeedEntry> {
    vec![
        entry(1, &user.username, Some(user.id), "Test post #1"),
        entry(2, &user.username, Some(user.id), "Test post #2"),
    ]
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn index(CurrentUser(user): CurrentUser, flashes: Flashes) -> Response {
    let content = views::index(&user, &placeholder_feed());
    views::render(
        StatusCode::OK,
        "Home",
        &Identity::User(user),
        flashes,
        &content,
    )
}
