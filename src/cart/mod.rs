pub mod dto;
pub mod handlers;
pub mod repo_types;
pub mod service;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::cart_routes()
}
