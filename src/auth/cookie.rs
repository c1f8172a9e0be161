use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CookieConfig;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn build(cfg: &CookieConfig, value: &str, max_age: u64) -> String {
    let secure = if cfg.secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite={}; Path=/; Max-Age={}{}",
        cfg.name,
        value,
        cfg.same_site.as_str(),
        max_age,
        secure
    )
}

pub fn session_cookie(cfg: &CookieConfig, token: &str, ttl: Duration) -> Option<HeaderValue> {
    HeaderValue::from_str(&build(cfg, token, ttl.as_secs())).ok()
}

pub fn clear_cookie(cfg: &CookieConfig) -> Option<HeaderValue> {
    HeaderValue::from_str(&build(cfg, "", 0)).ok()
}
