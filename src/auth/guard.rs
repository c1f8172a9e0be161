use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{
    auth::{cookie::get_cookie, extractors::AuthUser},
    error::AppError,
    state::AppState,
    users::{dto::UserProfile, repo_types::Role, services as credentials},
};

/// What a route demands before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token required or inspected.
    Public,
    /// Email and password in the body, checked by the `LocalAuth` extractor.
    Credentials,
    Authenticated,
    Admin,
}

/// Route table keyed by method and matched path pattern.
const ROUTE_POLICIES: &[(&str, &str, Access)] = &[
    ("GET", "/health", Access::Public),
    ("POST", "/auth/register", Access::Public),
    ("POST", "/auth/login", Access::Credentials),
    ("POST", "/auth/logout", Access::Public),
    ("GET", "/auth/me", Access::Authenticated),
    ("GET", "/auth/profile", Access::Authenticated),
    ("GET", "/todos", Access::Authenticated),
    ("POST", "/todos", Access::Authenticated),
    ("GET", "/todos/summarize", Access::Authenticated),
    ("GET", "/todos/:id", Access::Authenticated),
    ("PATCH", "/todos/:id", Access::Authenticated),
    ("DELETE", "/todos/:id", Access::Authenticated),
    ("GET", "/users", Access::Admin),
    ("PATCH", "/users/:id", Access::Admin),
    ("PATCH", "/users/:id/toggle-status", Access::Admin),
];

/// Unlisted routes require authentication. `HEAD` follows the `GET` entry.
pub fn policy_for(method: &str, path: &str) -> Access {
    let method = if method == "HEAD" { "GET" } else { method };
    ROUTE_POLICIES
        .iter()
        .find(|(m, p, _)| *m == method && *p == path)
        .map(|(_, _, access)| *access)
        .unwrap_or(Access::Authenticated)
}

/// Bearer header first, then the session cookie.
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    bearer.or_else(|| get_cookie(headers, cookie_name))
}

/// Resolves the token on the request to the user's current record.
async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<UserProfile, AppError> {
    let token = extract_token(headers, &state.config.cookie.name).ok_or_else(|| {
        debug!("request without session token");
        AppError::Unauthenticated
    })?;

    let claims = state.jwt.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Unauthenticated
    })?;

    let user = credentials::find_by_id(state.users.as_ref(), claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            AppError::Unauthenticated
        })?;

    if !user.is_active {
        warn!(user_id = %user.id, "token presented for disabled account");
        return Err(AppError::AccountDisabled);
    }
    Ok(user)
}

/// Per-request gate applied to every route. Attaches `AuthUser` to the request on success.
pub async fn guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| policy_for(req.method().as_str(), p.as_str()))
        .unwrap_or(Access::Authenticated);

    if matches!(access, Access::Public | Access::Credentials) {
        return Ok(next.run(req).await);
    }

    let user = resolve_user(&state, req.headers()).await?;

    if access == Access::Admin && user.role != Role::Admin {
        warn!(user_id = %user.id, path = %req.uri().path(), "admin route denied");
        return Err(AppError::Forbidden);
    }

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}
