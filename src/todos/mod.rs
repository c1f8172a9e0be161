mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod summarizer;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::todo_routes())
}
