use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::password;

pub const USERNAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 120;
pub const ABOUT_ME_MAX_LEN: usize = 140;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 PHC string, absent until registration completes
    pub about_me: Option<String>,
    pub last_seen: OffsetDateTime,
}

impl User {
    /// `Ok(false)` both for a wrong password and for an account without a hash.
    pub fn check_password(&self, plain: &str) -> anyhow::Result<bool> {
        match &self.password_hash {
            Some(hash) => password::verify_password(plain, hash),
            None => Ok(false),
        }
    }

    /// Gravatar URL for this user's email, falling back to an identicon.
    pub fn avatar(&self, size: u32) -> String {
        let digest = Sha256::digest(self.email.trim().to_lowercase().as_bytes());
        format!(
            "https://www.gravatar.com/avatar/{}?d=identicon&s={}",
            hex::encode(digest),
            size
        )
    }
}

/// Fields needed to insert a registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub about_me: Option<String>,
}
