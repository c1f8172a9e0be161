use anyhow::Context;
use serde::Deserialize;

/// Session lifetime when `JWT_TTL_MINUTES` is not set: 7 days.
const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => anyhow::bail!("unsupported COOKIE_SAME_SITE value: {other}"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// How the session token is delivered to browsers in addition to the response body.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub register_per_minute: u32,
    pub login_per_minute: u32,
    /// Header carrying the client address when running behind a proxy
    /// (e.g. `X-Forwarded-For`). Unset means the peer socket address.
    pub client_ip_header: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub cors_origins: Vec<String>,
    /// Emails that receive the admin role when they register.
    pub admin_emails: Vec<String>,
    pub summarizer_url: Option<String>,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "todo-auth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "todo-auth-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES").unwrap_or(DEFAULT_TTL_MINUTES),
        };

        let cookie = CookieConfig {
            name: std::env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "access_token".into()),
            secure: parse_var("COOKIE_SECURE").unwrap_or(true),
            same_site: match std::env::var("COOKIE_SAME_SITE") {
                Ok(raw) => SameSite::parse(&raw)?,
                Err(_) => SameSite::Lax,
            },
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let summarizer_url = std::env::var("SUMMARIZER_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let rate_limit = RateLimitConfig {
            register_per_minute: parse_var("REGISTER_PER_MINUTE").unwrap_or(5),
            login_per_minute: parse_var("LOGIN_PER_MINUTE").unwrap_or(10),
            client_ip_header: std::env::var("CLIENT_IP_HEADER")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        };

        Ok(Self {
            database_url,
            jwt,
            cookie,
            cors_origins,
            admin_emails,
            summarizer_url,
            rate_limit,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
