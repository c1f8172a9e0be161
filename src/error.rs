use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Email already exists")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Too many requests, please try again later")]
    TooManyRequests,
    #[error("authentication operation failed: {0:#}")]
    AuthOperationFailed(anyhow::Error),
    #[error("summarization failed: {0:#}")]
    SummarizationFailed(anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Errors produced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record conflicts with an existing one")]
    Conflict,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Backend(e.into()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AppError::AlreadyExists,
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::AuthOperationFailed(_)
            | AppError::SummarizationFailed(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal causes stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::AuthOperationFailed(_) => "Authentication failed, please retry later".into(),
            AppError::SummarizationFailed(_) => {
                "An error occurred while generating the summary. Please try again later.".into()
            }
            AppError::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
