pub mod handlers;
pub mod repo_types;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/index", get(handlers::index))
}
