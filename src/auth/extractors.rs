use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{Redirect, Response},
};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{redirect::login_url, session::SessionKeys};
use crate::{cookies, state::AppState, users::repo_types::User};

/// Who is making the current request. Placed in request extensions by [`load_identity`].
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Authenticated caller. Anonymous callers are redirected to the login page,
/// which sends them back here afterwards.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned().unwrap_or_default();
        match identity {
            Identity::User(user) => Ok(CurrentUser(user)),
            Identity::Anonymous => {
                let original = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!(path = original, "anonymous request to protected route");
                Err(Redirect::to(&login_url(original)))
            }
        }
    }
}

/// Resolves the session cookie to a user before any handler runs, and records
/// that the user was seen.
pub async fn load_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let keys = SessionKeys::from_ref(&state);
    let identity = match cookies::read(req.headers(), &keys.cookie_name) {
        Some(token) if !token.is_empty() => resolve(&state, &keys, &token).await,
        _ => Identity::Anonymous,
    };
    req.extensions_mut().insert(identity);
    next.run(req).await
}

async fn resolve(state: &AppState, keys: &SessionKeys, token: &str) -> Identity {
    let user_id = match keys.verify(token).map(|c| c.user_id()) {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!("session subject is not a user id");
            return Identity::Anonymous;
        }
        Err(e) => {
            debug!(error = %e, "ignoring invalid or expired session");
            return Identity::Anonymous;
        }
    };

    let mut user = match state.users.find_by_id(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(user_id, "session names unknown user");
            return Identity::Anonymous;
        }
        Err(e) => {
            warn!(error = %e, user_id, "loading session user failed");
            return Identity::Anonymous;
        }
    };

    let now = OffsetDateTime::now_utc();
    match state.users.touch_last_seen(user.id, now).await {
        Ok(()) => user.last_seen = now,
        Err(e) => warn!(error = %e, user_id = user.id, "updating last_seen failed"),
    }
    Identity::User(user)
}
