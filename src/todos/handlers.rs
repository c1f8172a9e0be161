use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{extractors::AuthUser, MessageResponse},
    error::AppError,
    state::AppState,
    todos::{
        dto::{CreateTodoRequest, SummaryResponse, TodoResponse, UpdateTodoRequest},
        services,
    },
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/summarize", get(summarize_todos))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
}

#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn create_todo(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<TodoResponse>), AppError> {
    let Json(body) = body?;
    let todo = services::create(state.todos.as_ref(), user.0.id, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/todos/{}", todo.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(todo.into())))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn list_todos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = services::list(state.todos.as_ref(), user.0.id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn get_todo(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Path(id) = id?;
    let todo = services::get(state.todos.as_ref(), user.0.id, id).await?;
    Ok(Json(todo.into()))
}

#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn update_todo(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let todo = services::update(state.todos.as_ref(), user.0.id, id, body).await?;
    Ok(Json(todo.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    services::delete(state.todos.as_ref(), user.0.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Todo deleted successfully",
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn summarize_todos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary =
        services::summarize(state.todos.as_ref(), state.summarizer.as_ref(), user.0.id).await?;
    Ok(Json(SummaryResponse { summary }))
}
