use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

/// Minimal user view returned next to a freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
        }
    }
}

impl PublicUser {
    pub fn from_profile(p: &UserProfile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            role: p.role,
        }
    }
}

/// Full user view for `/auth/me` and the admin listing. Carries no credential material.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            name: "Test".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            role: Role::Admin,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn views_never_contain_the_hash() {
        let user = sample();
        let public = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        let profile = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        for json in [public, profile] {
            assert!(json.contains("test@example.com"));
            assert!(json.contains("\"role\":\"admin\""));
            assert!(!json.contains("argon2"));
            assert!(!json.contains("password"));
        }
    }
}
