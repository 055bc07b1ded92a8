//! Participant domain models

use chrono::{DateTime, Utc};
use domain_events::{Event, EventStatus};
use domain_users::UserSummary;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Invitation state of a participant row.
///
/// Self-joined rows start `accepted`; invited rows start `pending`.
/// `accepted` and `declined` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

/// One row per (event, user) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub invitation_status: InvitationStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(event_id: Uuid, user_id: Uuid, invitation_status: InvitationStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            event_id,
            user_id,
            invitation_status,
            joined_at: now,
            updated_at: now,
        }
    }

    /// Row created by the user joining on their own
    pub fn joined(event_id: Uuid, user_id: Uuid) -> Self {
        Self::new(event_id, user_id, InvitationStatus::Accepted)
    }

    /// Row created by the event owner inviting someone
    pub fn invited(event_id: Uuid, user_id: Uuid) -> Self {
        Self::new(event_id, user_id, InvitationStatus::Pending)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteUser {
    pub event_id: Uuid,
    /// The user being invited
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondToInvitation {
    pub invitation_id: Uuid,
    /// `accepted` or `declined`
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationAction {
    pub invitation_id: Uuid,
}

/// Participant row with the user's display details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub invitation_status: InvitationStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl ParticipantResponse {
    pub fn new(participant: Participant, user: UserSummary) -> Self {
        Self {
            id: participant.id,
            event_id: participant.event_id,
            invitation_status: participant.invitation_status,
            joined_at: participant.joined_at,
            updated_at: participant.updated_at,
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub status: EventStatus,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date,
            location: event.location.clone(),
            status: event.status,
        }
    }
}

/// Participant row seen from the user's side, with the event it points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: Uuid,
    pub invitation_status: InvitationStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event: EventSummary,
}

impl InvitationResponse {
    pub fn new(participant: Participant, event: &Event) -> Self {
        Self {
            id: participant.id,
            invitation_status: participant.invitation_status,
            joined_at: participant.joined_at,
            updated_at: participant.updated_at,
            event: EventSummary::from(event),
        }
    }
}
