use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::error::{AppError, StoreError};
use crate::users::dto::UserProfile;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, Role, User};

/// Creates a user with a freshly hashed password.
pub async fn register(
    users: &dyn UserStore,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> Result<UserProfile, AppError> {
    if find_by_email(users, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::AlreadyExists);
    }

    let password_hash = hash_password(password).await?;
    let user = users
        .insert(NewUser {
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration
            StoreError::Conflict => AppError::AlreadyExists,
            other => other.into(),
        })?;

    info!(user_id = %user.id, role = ?user.role, "user created");
    Ok(UserProfile::from(&user))
}

pub async fn find_by_email(users: &dyn UserStore, email: &str) -> Result<Option<User>, AppError> {
    Ok(users.find_by_email(email).await?)
}

/// Checks an email/password pair.
///
/// Unknown email and wrong password both yield `Ok(None)` so callers cannot tell them
/// apart. A deactivated account is only reported once the password has matched.
pub async fn verify_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<Option<UserProfile>, AppError> {
    let Some(user) = users.find_by_email(email).await? else {
        debug!(email = %email, "credential check for unknown email");
        verify_dummy(password).await?;
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash).await? {
        debug!(user_id = %user.id, "credential check with wrong password");
        return Ok(None);
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login attempt on disabled account");
        return Err(AppError::AccountDisabled);
    }

    Ok(Some(UserProfile::from(&user)))
}

pub async fn find_by_id(users: &dyn UserStore, id: Uuid) -> Result<Option<UserProfile>, AppError> {
    Ok(users.find_by_id(id).await?.as_ref().map(UserProfile::from))
}

pub async fn set_active(
    users: &dyn UserStore,
    id: Uuid,
    active: bool,
) -> Result<UserProfile, AppError> {
    let user = users
        .set_active(id, active)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = %user.id, active, "user status changed");
    Ok(UserProfile::from(&user))
}

/// Flips the active flag of a user.
pub async fn toggle_active(users: &dyn UserStore, id: Uuid) -> Result<UserProfile, AppError> {
    let user = users
        .toggle_active(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = %user.id, active = user.is_active, "user status toggled");
    Ok(UserProfile::from(&user))
}

pub async fn list_all(users: &dyn UserStore) -> Result<Vec<UserProfile>, AppError> {
    Ok(users.list_all().await?.iter().map(UserProfile::from).collect())
}
