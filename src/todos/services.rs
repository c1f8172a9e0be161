use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::todos::dto::{CreateTodoRequest, UpdateTodoRequest};
use crate::todos::repo::TodoStore;
use crate::todos::repo_types::{NewTodo, Todo, TodoPatch};
use crate::todos::summarizer::{Summarizer, TodoDigest};

pub const EMPTY_SUMMARY: &str = "No todos found to summarize.";

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    Ok(title.to_string())
}

pub async fn create(
    todos: &dyn TodoStore,
    user_id: Uuid,
    req: CreateTodoRequest,
) -> Result<Todo, AppError> {
    let todo = todos
        .insert(
            user_id,
            NewTodo {
                title: validate_title(&req.title)?,
                description: req.description,
                completed: req.completed,
            },
        )
        .await?;
    info!(%user_id, todo_id = %todo.id, "todo created");
    Ok(todo)
}

pub async fn list(todos: &dyn TodoStore, user_id: Uuid) -> Result<Vec<Todo>, AppError> {
    Ok(todos.list_by_user(user_id).await?)
}

/// Missing and foreign ids are indistinguishable to the caller.
pub async fn get(todos: &dyn TodoStore, user_id: Uuid, id: Uuid) -> Result<Todo, AppError> {
    todos
        .find(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Todo"))
}

pub async fn update(
    todos: &dyn TodoStore,
    user_id: Uuid,
    id: Uuid,
    req: UpdateTodoRequest,
) -> Result<Todo, AppError> {
    let mut patch = TodoPatch::from(req);
    if let Some(title) = patch.title.as_deref() {
        patch.title = Some(validate_title(title)?);
    }
    let todo = todos
        .update(user_id, id, patch)
        .await?
        .ok_or(AppError::NotFound("Todo"))?;
    info!(%user_id, todo_id = %todo.id, "todo updated");
    Ok(todo)
}

pub async fn delete(todos: &dyn TodoStore, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if !todos.delete(user_id, id).await? {
        return Err(AppError::NotFound("Todo"));
    }
    info!(%user_id, todo_id = %id, "todo deleted");
    Ok(())
}

/// Summary of the caller's todos. An empty list never reaches the summarizer.
pub async fn summarize(
    todos: &dyn TodoStore,
    summarizer: &dyn Summarizer,
    user_id: Uuid,
) -> Result<String, AppError> {
    let items = todos.list_by_user(user_id).await?;
    if items.is_empty() {
        return Ok(EMPTY_SUMMARY.to_string());
    }

    let digests: Vec<TodoDigest> = items
        .into_iter()
        .map(|t| TodoDigest {
            title: t.title,
            description: t.description.unwrap_or_default(),
            completed: t.completed,
        })
        .collect();

    let summary = summarizer.summarize(&digests).await.map_err(|e| {
        error!(error = %e, %user_id, "summary generation failed");
        AppError::SummarizationFailed(e)
    })?;
    info!(%user_id, count = digests.len(), "summary generated");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingSummarizer, MemoryTodoStore};

    fn new_todo(title: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.into(),
            description: None,
            completed: false,
        }
    }

    #[tokio::test]
    async fn todos_are_scoped_to_their_owner() {
        let store = MemoryTodoStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let todo = create(&store, bob, new_todo("Bob's secret")).await.unwrap();

        assert!(matches!(get(&store, alice, todo.id).await, Err(AppError::NotFound(_))));
        let patch = UpdateTodoRequest {
            completed: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            update(&store, alice, todo.id, patch).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(delete(&store, alice, todo.id).await, Err(AppError::NotFound(_))));
        assert!(list(&store, alice).await.unwrap().is_empty());

        let still_there = get(&store, bob, todo.id).await.unwrap();
        assert!(!still_there.completed);
    }

    #[tokio::test]
    async fn partial_update_keeps_untouched_fields() {
        let store = MemoryTodoStore::default();
        let owner = Uuid::new_v4();
        let todo = create(
            &store,
            owner,
            CreateTodoRequest {
                title: "Write tests".into(),
                description: Some("for the guard".into()),
                completed: false,
            },
        )
        .await
        .unwrap();

        let patch = UpdateTodoRequest {
            completed: Some(true),
            ..Default::default()
        };
        let updated = update(&store, owner, todo.id, patch).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Write tests");
        assert_eq!(updated.description.as_deref(), Some("for the guard"));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let store = MemoryTodoStore::default();
        let owner = Uuid::new_v4();
        assert!(matches!(
            create(&store, owner, new_todo("   ")).await,
            Err(AppError::BadRequest(_))
        ));
        let todo = create(&store, owner, new_todo("ok")).await.unwrap();
        let patch = UpdateTodoRequest {
            title: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(
            update(&store, owner, todo.id, patch).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn empty_collection_skips_the_summarizer() {
        let store = MemoryTodoStore::default();
        let summarizer = CountingSummarizer::default();
        let summary = summarize(&store, &summarizer, Uuid::new_v4()).await.unwrap();
        assert_eq!(summary, EMPTY_SUMMARY);
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn summarizer_sees_only_the_callers_todos() {
        let store = MemoryTodoStore::default();
        let summarizer = CountingSummarizer::default();
        let owner = Uuid::new_v4();
        create(&store, owner, new_todo("mine")).await.unwrap();
        create(&store, Uuid::new_v4(), new_todo("theirs")).await.unwrap();

        let summary = summarize(&store, &summarizer, owner).await.unwrap();
        assert_eq!(summarizer.calls(), 1);
        assert_eq!(summary, "1 todos: mine");
    }

    #[tokio::test]
    async fn summarizer_failure_is_reported() {
        let store = MemoryTodoStore::default();
        let owner = Uuid::new_v4();
        create(&store, owner, new_todo("mine")).await.unwrap();
        let summarizer = CountingSummarizer::failing();
        let err = summarize(&store, &summarizer, owner).await.unwrap_err();
        assert!(matches!(err, AppError::SummarizationFailed(_)));
    }
}
