use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Todo with ID {0} not found")]
    NotFound(i32),

    #[error("SubTask with ID {0} not found")]
    SubTaskNotFound(i32),

    #[error("Category with ID {0} not found")]
    CategoryNotFound(i32),

    /// Batch call where none of the ids belong to the caller
    #[error("{0}")]
    NothingAffected(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_)
            | TodoError::SubTaskNotFound(_)
            | TodoError::CategoryNotFound(_)
            | TodoError::NothingAffected(_) => AppError::NotFound(err.to_string()),
            TodoError::Forbidden(msg) => AppError::Forbidden(msg),
            TodoError::Validation(msg) => AppError::BadRequest(msg),
            TodoError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
