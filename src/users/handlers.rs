use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    users::{
        dto::{SetActiveRequest, UserProfile},
        services,
    },
};

/// Admin-only; the role check lives in the route policy table.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", patch(set_user_status))
        .route("/users/:id/toggle-status", patch(toggle_user_status))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AuthUser,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    Ok(Json(services::list_all(state.users.as_ref()).await?))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.0.id))]
pub async fn set_user_status(
    State(state): State<AppState>,
    admin: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    Ok(Json(
        services::set_active(state.users.as_ref(), id, body.active).await?,
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    admin: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Path(id) = id?;
    Ok(Json(services::toggle_active(state.users.as_ref(), id).await?))
}
