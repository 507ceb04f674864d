pub mod dto;
pub mod handlers;
mod repo;
pub mod repo_types;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
