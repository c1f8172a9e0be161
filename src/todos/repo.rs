use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::todos::repo_types::{NewTodo, Todo, TodoPatch};

/// Persistence seam for todos. Every call is scoped to the owning user.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, todo: NewTodo) -> Result<Todo, StoreError>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, StoreError>;
    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError>;
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgTodoStore {
    db: PgPool,
}

impl PgTodoStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn insert(&self, user_id: Uuid, todo: NewTodo) -> Result<Todo, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (user_id, title, description, completed)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
              FROM todos
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
              FROM todos
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
               SET title       = COALESCE($3, title),
                   description = COALESCE($4, description),
                   completed   = COALESCE($5, completed),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.completed)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
