use crate::state::AppState;
use axum::Router;

mod claims;
pub mod cookie;
mod dto;
pub(crate) mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;
pub mod throttle;

pub use dto::MessageResponse;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes(state))
        .merge(handlers::me_routes())
}
