use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use tracing::warn;

use crate::{config::RateLimitConfig, error::AppError, state::AppState};

/// Token buckets keyed by client address.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-client buckets for the unauthenticated auth endpoints.
#[derive(Clone)]
pub struct Throttle {
    register: Arc<IpLimiter>,
    login: Arc<IpLimiter>,
    client_ip_header: Option<String>,
}

fn per_minute(n: u32) -> Arc<IpLimiter> {
    let n = NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::keyed(Quota::per_minute(n)))
}

impl Throttle {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            register: per_minute(cfg.register_per_minute),
            login: per_minute(cfg.login_per_minute),
            client_ip_header: cfg.client_ip_header.clone(),
        }
    }
}

/// Client address from the configured proxy header, or from the peer socket.
///
/// With a header configured its first entry must parse as an IP; the socket is not
/// consulted then, so a proxy misconfiguration surfaces instead of lumping every
/// client behind the proxy address.
pub fn client_ip(req: &Request, header: Option<&str>) -> Option<String> {
    match header {
        Some(name) => req
            .headers()
            .get(name)?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse::<IpAddr>()
            .ok()
            .map(|ip| ip.to_string()),
        None => req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string()),
    }
}

async fn check(
    limiter: &IpLimiter,
    header: Option<&str>,
    endpoint: &'static str,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&req, header) else {
        warn!(endpoint, "unable to determine client ip");
        return Err(AppError::BadRequest("Unable to determine client IP".into()));
    };
    if limiter.check_key(&ip).is_err() {
        warn!(endpoint, %ip, "rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(req).await)
}

pub async fn throttle_register(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let throttle = &state.throttle;
    check(
        &throttle.register,
        throttle.client_ip_header.as_deref(),
        "register",
        req,
        next,
    )
    .await
}

pub async fn throttle_login(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let throttle = &state.throttle;
    check(
        &throttle.login,
        throttle.client_ip_header.as_deref(),
        "login",
        req,
        next,
    )
    .await
}
