use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::users::repo_types::{NewUser, User};

/// Persistence seam for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with `StoreError::Conflict` when the email is already taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError>;
    /// Flips the flag in a single write.
    async fn toggle_active(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, is_active, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_active = $2, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn toggle_active(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_active = NOT is_active, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}
