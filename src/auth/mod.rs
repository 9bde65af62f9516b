use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod redirect;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
