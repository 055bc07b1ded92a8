//! Participant domain error types

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_events::EventError;
use domain_users::UserError;
use thiserror::Error;

use crate::models::InvitationStatus;

#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("Event not found")]
    EventNotFound,

    #[error("User not found")]
    UserNotFound,

    /// Missing, or owned by someone other than the caller
    #[error("Invitation not found")]
    InvitationNotFound,

    #[error("Only the event owner can invite users")]
    NotEventOwner,

    #[error("Cannot join past events")]
    PastEvent,

    #[error("Already joined this event")]
    AlreadyJoined,

    #[error("User already invited or joined")]
    AlreadyInvited,

    #[error("Invitation already declined")]
    AlreadyDeclined,

    #[error("Event no longer exists")]
    EventGone,

    #[error("Event has already taken place")]
    EventPassed,

    #[error("You are not a participant in this event")]
    NotParticipant,

    #[error("Invalid status. Must be 'accepted' or 'declined'")]
    InvalidResponse,

    /// Storage-level (event, user) uniqueness violation
    #[error("Participant already exists")]
    Duplicate,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ParticipantResult<T> = Result<T, ParticipantError>;

impl ParticipantError {
    /// Rejection for acting on an invitation that is no longer pending
    pub fn not_pending(status: InvitationStatus) -> Self {
        match status {
            InvitationStatus::Accepted => Self::AlreadyJoined,
            InvitationStatus::Declined => Self::AlreadyDeclined,
            InvitationStatus::Pending => Self::InvitationNotFound,
        }
    }
}

impl From<ParticipantError> for AppError {
    fn from(err: ParticipantError) -> Self {
        match err {
            err @ (ParticipantError::EventNotFound
            | ParticipantError::UserNotFound
            | ParticipantError::InvitationNotFound) => AppError::NotFound(err.to_string()),
            err @ ParticipantError::NotEventOwner => AppError::Forbidden(err.to_string()),
            err @ (ParticipantError::PastEvent
            | ParticipantError::AlreadyJoined
            | ParticipantError::AlreadyInvited
            | ParticipantError::AlreadyDeclined
            | ParticipantError::EventGone
            | ParticipantError::EventPassed
            | ParticipantError::NotParticipant
            | ParticipantError::InvalidResponse
            | ParticipantError::Duplicate) => AppError::BadRequest(err.to_string()),
            ParticipantError::Database(msg) => AppError::Database(msg),
            ParticipantError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ParticipantError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for ParticipantError {
    fn from(err: mongodb::error::Error) -> Self {
        ParticipantError::Database(err.to_string())
    }
}

impl From<EventError> for ParticipantError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => ParticipantError::EventNotFound,
            EventError::Database(msg) => ParticipantError::Database(msg),
            other => ParticipantError::Internal(other.to_string()),
        }
    }
}

impl From<UserError> for ParticipantError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ParticipantError::UserNotFound,
            UserError::Database(msg) => ParticipantError::Database(msg),
            other => ParticipantError::Internal(other.to_string()),
        }
    }
}

/// For the lookups this domain answers on behalf of the events domain
impl From<ParticipantError> for EventError {
    fn from(err: ParticipantError) -> Self {
        match err {
            ParticipantError::Database(msg) => EventError::Database(msg),
            other => EventError::Internal(other.to_string()),
        }
    }
}
