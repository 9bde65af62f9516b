use std::fmt;

use axum::http::StatusCode;
use tracing::error;

/// Column guarded by a uniqueness constraint in the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    /// Form field the conflict is reported on.
    pub fn field_name(self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0} already taken")]
    Conflict(UniqueField),
    #[error("user {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) fn internal<E: fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}
