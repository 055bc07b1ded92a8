//! Event domain error types

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::EventStatus;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    NotFound(Uuid),

    #[error("Not authorized to {action} this event")]
    Forbidden { action: &'static str },

    #[error("Event is already {0}")]
    AlreadyDecided(EventStatus),

    #[error("Invalid status. Use 'approved' or 'rejected'")]
    InvalidDecision,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => AppError::NotFound("Event not found".to_string()),
            err @ EventError::Forbidden { .. } => AppError::Forbidden(err.to_string()),
            err @ (EventError::AlreadyDecided(_) | EventError::InvalidDecision) => {
                AppError::BadRequest(err.to_string())
            }
            EventError::Validation(msg) => AppError::BadRequest(msg),
            EventError::Database(msg) => AppError::Database(msg),
            EventError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        EventError::Database(err.to_string())
    }
}

impl From<domain_users::UserError> for EventError {
    fn from(err: domain_users::UserError) -> Self {
        EventError::Internal(format!("User lookup failed: {}", err))
    }
}
