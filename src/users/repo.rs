use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::{RepoError, UniqueField};
use crate::users::repo_types::{NewUser, ProfileUpdate, User};

/// Storage for user accounts. Uniqueness of username and email is enforced here,
/// whatever the forms checked beforehand.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError>;
    async fn touch_last_seen(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("email") => UniqueField::Email,
                _ => UniqueField::Username,
            };
            return RepoError::Conflict(field);
        }
    }
    RepoError::Database(e)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, about_me, last_seen
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, about_me, last_seen
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, about_me, last_seen
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, about_me, last_seen
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = $2, about_me = $3
             WHERE id = $1
            RETURNING id, username, email, password_hash, about_me, last_seen
            "#,
        )
        .bind(id)
        .bind(&update.username)
        .bind(&update.about_me)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or(RepoError::NotFound(id))
    }

    async fn touch_last_seen(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET last_seen = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
