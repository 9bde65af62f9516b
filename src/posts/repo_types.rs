use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

pub const BODY_MAX_LEN: usize = 140;

/// Row of the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub body: String,
    pub timestamp: OffsetDateTime,
    pub user_id: Option<i64>,
}

/// A post together with the name it is shown under.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub author: String,
    pub post: Post,
}
