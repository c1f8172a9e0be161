use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, users::dto::PublicUser};

/// Signing and verification keys, built once from configuration.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user: &PublicUser) -> anyhow::Result<String> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `now`.
    pub fn sign_at(&self, user: &PublicUser, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: Some(user.role),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    /// Fails on a bad signature, malformed payload, wrong issuer/audience, or once
    /// the current second reaches `exp`.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        // jsonwebtoken still accepts exp == now
        let now = OffsetDateTime::now_utc().unix_timestamp();
        anyhow::ensure!((data.claims.exp as i64) > now, "token expired");
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24 * 7,
        })
    }

    fn user() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            role: Role::User,
        }
    }

    #[test]
    fn sign_and_verify_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user = user();
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::days(8);
        let token = keys.sign_at(&user(), issued).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_token_at_its_expiry_second() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let ttl = TimeDuration::seconds(keys.ttl().as_secs() as i64);
        let issued = OffsetDateTime::now_utc() - ttl;
        let token = keys.sign_at(&user(), issued).expect("sign");
        assert!(keys.verify(&token).is_err());

        let fresh = keys
            .sign_at(&user(), issued + TimeDuration::minutes(1))
            .expect("sign");
        assert!(keys.verify(&fresh).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys("secret-a", "iss", "aud");
        let other = make_keys("secret-b", "iss", "aud");
        let token = keys.sign(&user()).expect("sign");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign(&user()).expect("sign");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not.a.token").is_err());
        assert!(keys.verify("").is_err());
    }
}
