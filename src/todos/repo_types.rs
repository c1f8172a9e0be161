use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Todo record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid, // owner
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}
