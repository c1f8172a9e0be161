use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use tracing::warn;

use crate::{
    auth::{dto::LoginRequest, services},
    error::AppError,
    state::AppState,
    users::dto::UserProfile,
};

/// The user the guard resolved for this request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// Login body whose credentials have been verified against the user store.
pub struct LocalAuth(pub UserProfile);

#[async_trait]
impl FromRequest<AppState> for LocalAuth {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<LoginRequest>::from_request(req, state).await?;

        let email = payload.email.trim();
        match services::authenticate(state.users.as_ref(), email, &payload.password).await {
            Ok(user) => Ok(LocalAuth(user)),
            Err(e) => {
                if matches!(e, AppError::InvalidCredentials) {
                    warn!(email = %email, "login with invalid credentials");
                }
                Err(e)
            }
        }
    }
}
