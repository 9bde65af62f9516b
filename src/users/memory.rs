use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{RepoError, UniqueField};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, ProfileUpdate, User};

/// In-process user store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl Inner {
    fn taken(&self, field: UniqueField, value: &str, except: Option<i64>) -> bool {
        self.users.values().any(|u| {
            let candidate = match field {
                UniqueField::Username => &u.username,
                UniqueField::Email => &u.email,
            };
            candidate == value && Some(u.id) != except
        })
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut inner = self.inner.write().await;
        if inner.taken(UniqueField::Username, &new_user.username, None) {
            return Err(RepoError::Conflict(UniqueField::Username));
        }
        if inner.taken(UniqueField::Email, &new_user.email, None) {
            return Err(RepoError::Conflict(UniqueField::Email));
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: Some(new_user.password_hash),
            about_me: None,
            last_seen: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError> {
        let mut inner = self.inner.write().await;
        if inner.taken(UniqueField::Username, &update.username, Some(id)) {
            return Err(RepoError::Conflict(UniqueField::Username));
        }
        let user = inner.users.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        user.username = update.username;
        user.about_me = update.about_me;
        Ok(user.clone())
    }

    async fn touch_last_seen(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&id) {
            user.last_seen = at;
        }
        Ok(())
    }
}
