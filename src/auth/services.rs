use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info};

use crate::auth::dto::AuthResponse;
use crate::auth::jwt::JwtKeys;
use crate::error::AppError;
use crate::users::dto::{PublicUser, UserProfile};
use crate::users::repo::UserStore;
use crate::users::repo_types::Role;
use crate::users::services as credentials;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Keeps input and account-state errors intact; everything else becomes
/// `AuthOperationFailed`.
fn auth_failure(e: AppError) -> AppError {
    match e {
        AppError::Internal(cause) => {
            error!(error = %cause, "auth operation failed");
            AppError::AuthOperationFailed(cause)
        }
        other => other,
    }
}

fn issue(keys: &JwtKeys, user: PublicUser) -> Result<AuthResponse, AppError> {
    let token = keys.sign(&user).map_err(AppError::AuthOperationFailed)?;
    Ok(AuthResponse { user, token })
}

/// Creates the account and logs it in straight away.
pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> Result<AuthResponse, AppError> {
    if !is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let profile = credentials::register(users, email, name.trim(), password, role)
        .await
        .map_err(auth_failure)?;
    info!(user_id = %profile.id, "user registered");
    issue(keys, PublicUser::from_profile(&profile))
}

/// Issues a session for a user whose credentials were already verified.
pub fn login(keys: &JwtKeys, user: &UserProfile) -> Result<AuthResponse, AppError> {
    info!(user_id = %user.id, "user logged in");
    issue(keys, PublicUser::from_profile(user))
}

/// Credential check used by the login extractor.
pub async fn authenticate(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<UserProfile, AppError> {
    credentials::verify_credentials(users, email, password)
        .await
        .map_err(auth_failure)?
        .ok_or(AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::testing::MemoryUserStore;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes: 60,
        })
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("with space@x.com"));
    }

    #[tokio::test]
    async fn register_issues_a_token_for_the_new_user() {
        let store = MemoryUserStore::default();
        let keys = keys();
        let res = register(&store, &keys, "a@x.com", "A", "pw1", Role::User)
            .await
            .unwrap();
        let claims = keys.verify(&res.token).unwrap();
        assert_eq!(claims.sub, res.user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(res.user.name, "A");
    }

    #[tokio::test]
    async fn register_rejects_bad_input_before_touching_the_store() {
        let store = MemoryUserStore::default();
        let keys = keys();
        for (email, name, pw) in [("bad", "A", "pw"), ("a@x.com", " ", "pw"), ("a@x.com", "A", "")] {
            let err = register(&store, &keys, email, name, pw, Role::User)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn register_propagates_already_exists() {
        let store = MemoryUserStore::default();
        let keys = keys();
        register(&store, &keys, "a@x.com", "A", "pw1", Role::User).await.unwrap();
        let err = register(&store, &keys, "a@x.com", "A", "pw1", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists));
    }

    #[tokio::test]
    async fn authenticate_distinguishes_disabled_from_bad_credentials() {
        let store = MemoryUserStore::default();
        let keys = keys();
        let res = register(&store, &keys, "a@x.com", "A", "pw1", Role::User)
            .await
            .unwrap();

        let err = authenticate(&store, "a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        credentials::set_active(&store, res.user.id, false).await.unwrap();
        let err = authenticate(&store, "a@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::AccountDisabled));
    }

    #[tokio::test]
    async fn login_exposes_only_the_minimal_view() {
        let store = MemoryUserStore::default();
        let keys = keys();
        register(&store, &keys, "a@x.com", "A", "pw1", Role::User).await.unwrap();
        let profile = authenticate(&store, "a@x.com", "pw1").await.unwrap();
        let res = login(&keys, &profile).unwrap();

        let json = serde_json::to_value(&res).unwrap();
        let user = json["user"].as_object().unwrap();
        let mut fields: Vec<_> = user.keys().cloned().collect();
        fields.sort();
        assert_eq!(fields, vec!["email", "id", "name", "role"]);
        assert_eq!(keys.verify(&res.token).unwrap().sub, profile.id);
    }
}
