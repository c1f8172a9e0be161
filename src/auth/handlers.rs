use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        cookie::{clear_cookie, session_cookie},
        dto::{AuthResponse, MessageResponse, RegisterRequest},
        extractors::{AuthUser, LocalAuth},
        services,
        throttle::{throttle_login, throttle_register},
    },
    error::AppError,
    state::AppState,
    users::{dto::UserProfile, repo_types::Role},
};

pub fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/auth/register",
            post(register).route_layer(from_fn_with_state(state.clone(), throttle_register)),
        )
        .route(
            "/auth/login",
            post(login).route_layer(from_fn_with_state(state.clone(), throttle_login)),
        )
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", get(get_me))
}

fn with_session_cookie(state: &AppState, token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = session_cookie(&state.config.cookie, token, state.jwt.ttl()) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    let role = if state.config.admin_emails.iter().any(|a| a == email) {
        Role::Admin
    } else {
        Role::User
    };

    let res = services::register(
        state.users.as_ref(),
        &state.jwt,
        email,
        &payload.name,
        &payload.password,
        role,
    )
    .await?;

    let headers = with_session_cookie(&state, &res.token);
    Ok((StatusCode::CREATED, headers, Json(res)))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    LocalAuth(user): LocalAuth,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    let res = services::login(&state.jwt, &user)?;
    let headers = with_session_cookie(&state, &res.token);
    Ok((headers, Json(res)))
}

/// Clears the session cookie. The token itself stays valid until it expires.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageResponse>) {
    let mut headers = HeaderMap::new();
    if let Some(value) = clear_cookie(&state.config.cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    (
        headers,
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user)
}
