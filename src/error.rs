use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use serde_json::json;
use std::fmt;

/// Failure taxonomy of the task lifecycle. Everything the coordinator can go
/// wrong with is one of these; nothing escapes it as an unhandled fault.
#[derive(Debug)]
pub enum TaskError {
    /// The uploaded file was rejected before any store write.
    Validation(String),
    /// The analysis service was unreachable or reported an error.
    Transport(String),
    /// A store write failed and was rolled back.
    Persistence(sea_orm::DbErr),
    /// The polling budget was exhausted without a terminal remote status.
    Timeout,
    /// The result is committed but could not be handed to the requester.
    Delivery(String),
    /// The user already has a task in flight.
    Busy,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Validation(reason) => write!(f, "validation failed: {}", reason),
            TaskError::Transport(msg) => write!(f, "analysis service error: {}", msg),
            TaskError::Persistence(e) => write!(f, "storage error: {}", e),
            TaskError::Timeout => write!(f, "timed out waiting for the analysis result"),
            TaskError::Delivery(msg) => write!(f, "result delivery failed: {}", msg),
            TaskError::Busy => write!(f, "a previous analysis request is still in progress"),
        }
    }
}

impl From<sea_orm::DbErr> for TaskError {
    fn from(err: sea_orm::DbErr) -> Self {
        TaskError::Persistence(err)
    }
}

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sea_orm::DbErr),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(e) => {
                eprintln!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::InternalServerError(msg) => {
                eprintln!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(reason) => AppError::BadRequest(reason),
            TaskError::Busy => {
                AppError::Conflict("A previous analysis request is still in progress".to_string())
            }
            TaskError::Transport(msg) => AppError::BadGateway(msg),
            TaskError::Persistence(e) => AppError::DatabaseError(e),
            TaskError::Timeout | TaskError::Delivery(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}
