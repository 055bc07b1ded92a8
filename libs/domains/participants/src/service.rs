//! Participant Service - Business logic layer

use async_trait::async_trait;
use axum_helpers::AuthUser;
use domain_events::{Event, EventApprovalHook, EventRepository, EventResult, ParticipationLookup};
use domain_users::{UserDirectory, UserSummary};
use email::{EventEmailDetails, NotificationService};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ParticipantError, ParticipantResult};
use crate::models::{
    InvitationResponse, InvitationStatus, InviteUser, Participant, ParticipantResponse,
};
use crate::repository::ParticipantRepository;

/// Participant service providing business logic operations
///
/// Events and users are read through their own domains' seams; this
/// service only ever writes participant rows.
pub struct ParticipantService<R: ParticipantRepository> {
    repository: Arc<R>,
    events: Arc<dyn EventRepository>,
    users: Arc<dyn UserDirectory>,
    notifications: Option<NotificationService>,
}

impl<R: ParticipantRepository> ParticipantService<R> {
    pub fn new(
        repository: R,
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            events,
            users,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationService) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Join an upcoming event. The row is created already `accepted`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn join(&self, event_id: Uuid, user: &AuthUser) -> ParticipantResult<Participant> {
        let event = self.event(event_id).await?;

        if event.is_past() {
            return Err(ParticipantError::PastEvent);
        }

        if self.repository.find(event_id, user.id).await?.is_some() {
            return Err(ParticipantError::AlreadyJoined);
        }

        let participant = self
            .repository
            .create(Participant::joined(event_id, user.id))
            .await
            .map_err(|e| match e {
                ParticipantError::Duplicate => ParticipantError::AlreadyJoined,
                other => other,
            })?;

        tracing::info!(event_id = %event_id, user_id = %user.id, "User joined event");
        Ok(participant)
    }

    /// Invite a user to an event the inviter owns.
    ///
    /// The invitation email goes out now if the event is approved, otherwise
    /// when an admin approves it.
    #[instrument(skip(self, input, inviter), fields(inviter_id = %inviter.id))]
    pub async fn invite(
        &self,
        input: InviteUser,
        inviter: &AuthUser,
    ) -> ParticipantResult<Participant> {
        let event = self.event(input.event_id).await?;

        if event.created_by != inviter.id {
            return Err(ParticipantError::NotEventOwner);
        }

        let invitee = self
            .users
            .find_summary(input.user_id)
            .await?
            .ok_or(ParticipantError::UserNotFound)?;

        if self
            .repository
            .find(event.id, invitee.id)
            .await?
            .is_some()
        {
            return Err(ParticipantError::AlreadyInvited);
        }

        let participant = self
            .repository
            .create(Participant::invited(event.id, invitee.id))
            .await
            .map_err(|e| match e {
                ParticipantError::Duplicate => ParticipantError::AlreadyInvited,
                other => other,
            })?;

        tracing::info!(event_id = %event.id, invitee_id = %invitee.id, "User invited");

        if event.status == domain_events::EventStatus::Approved {
            self.send_invitation(&invitee, &event);
        } else {
            tracing::debug!(event_id = %event.id, "Invitation email deferred until approval");
        }

        Ok(participant)
    }

    /// Accept or decline by status string
    pub async fn respond(
        &self,
        invitation_id: Uuid,
        user: &AuthUser,
        status: &str,
    ) -> ParticipantResult<Participant> {
        match status.parse::<InvitationStatus>() {
            Ok(InvitationStatus::Accepted) => self.accept(invitation_id, user).await,
            Ok(InvitationStatus::Declined) => self.decline(invitation_id, user).await,
            _ => Err(ParticipantError::InvalidResponse),
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn accept(
        &self,
        invitation_id: Uuid,
        user: &AuthUser,
    ) -> ParticipantResult<Participant> {
        let invitation = self.own_pending_invitation(invitation_id, user).await?;

        let event = self
            .events
            .get_by_id(invitation.event_id)
            .await?
            .ok_or(ParticipantError::EventGone)?;

        if event.is_past() {
            return Err(ParticipantError::EventPassed);
        }

        let accepted = self
            .repository
            .update_status(invitation.id, InvitationStatus::Accepted)
            .await?;

        tracing::info!(invitation_id = %invitation.id, "Invitation accepted");
        Ok(accepted)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn decline(
        &self,
        invitation_id: Uuid,
        user: &AuthUser,
    ) -> ParticipantResult<Participant> {
        let invitation = self.own_pending_invitation(invitation_id, user).await?;

        let declined = self
            .repository
            .update_status(invitation.id, InvitationStatus::Declined)
            .await?;

        tracing::info!(invitation_id = %invitation.id, "Invitation declined");
        Ok(declined)
    }

    /// Remove the caller's row for an event. Rejoining afterwards is allowed.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn leave(&self, event_id: Uuid, user: &AuthUser) -> ParticipantResult<()> {
        let participant = self
            .repository
            .find(event_id, user.id)
            .await?
            .ok_or(ParticipantError::NotParticipant)?;

        self.repository.delete(participant.id).await?;

        tracing::info!(event_id = %event_id, user_id = %user.id, "User left event");
        Ok(())
    }

    /// Rows of one event with user details; rows of deleted users are skipped
    #[instrument(skip(self))]
    pub async fn list_participants(
        &self,
        event_id: Uuid,
    ) -> ParticipantResult<Vec<ParticipantResponse>> {
        self.event(event_id).await?;

        let rows = self.repository.list_by_event(event_id).await?;
        let users = self.user_summaries(&rows).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let user = users.get(&row.user_id)?.clone();
                Some(ParticipantResponse::new(row, user))
            })
            .collect())
    }

    /// Pending invitations to events that still exist and have not happened yet
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn my_invitations(&self, user: &AuthUser) -> ParticipantResult<Vec<InvitationResponse>> {
        let rows = self
            .repository
            .list_by_user(user.id, Some(InvitationStatus::Pending))
            .await?;

        let mut invitations = self.with_events(rows).await?;
        invitations.retain(|(_, event)| !event.is_past());
        Ok(into_responses(invitations))
    }

    /// Events the user has accepted
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn joined_events(&self, user: &AuthUser) -> ParticipantResult<Vec<InvitationResponse>> {
        let rows = self
            .repository
            .list_by_user(user.id, Some(InvitationStatus::Accepted))
            .await?;

        Ok(into_responses(self.with_events(rows).await?))
    }

    /// Email everyone attached to a freshly approved event.
    ///
    /// Pending invitees get the invitation they were waiting for; everyone
    /// else gets the approval notice. Returns the number of emails queued.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn notify_approval(&self, event: &Event) -> ParticipantResult<usize> {
        let Some(notifications) = &self.notifications else {
            return Ok(0);
        };

        let rows = self.repository.list_by_event(event.id).await?;
        let users = self.user_summaries(&rows).await?;
        let details = email_details(event);

        let mut queued = 0;
        for row in &rows {
            let Some(user) = users.get(&row.user_id) else {
                continue;
            };

            let result = match row.invitation_status {
                InvitationStatus::Pending => {
                    notifications.queue_invitation_email(&user.email, &user.name, &details)
                }
                _ => notifications.queue_event_approved_email(&user.email, &user.name, &details),
            };

            match result {
                Ok(()) => queued += 1,
                Err(e) => tracing::warn!(user_id = %user.id, error = %e, "Failed to queue approval email"),
            }
        }

        tracing::info!(event_id = %event.id, queued, "Approval emails queued");
        Ok(queued)
    }

    async fn event(&self, id: Uuid) -> ParticipantResult<Event> {
        self.events
            .get_by_id(id)
            .await?
            .ok_or(ParticipantError::EventNotFound)
    }

    async fn own_pending_invitation(
        &self,
        invitation_id: Uuid,
        user: &AuthUser,
    ) -> ParticipantResult<Participant> {
        let invitation = self
            .repository
            .get_by_id(invitation_id)
            .await?
            .filter(|row| row.user_id == user.id)
            .ok_or(ParticipantError::InvitationNotFound)?;

        match invitation.invitation_status {
            InvitationStatus::Pending => Ok(invitation),
            status => Err(ParticipantError::not_pending(status)),
        }
    }

    async fn user_summaries(
        &self,
        rows: &[Participant],
    ) -> ParticipantResult<HashMap<Uuid, UserSummary>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        Ok(self.users.find_summaries(&ids).await?)
    }

    /// Pair rows with their events, dropping rows whose event is gone, ordered by event date
    async fn with_events(
        &self,
        rows: Vec<Participant>,
    ) -> ParticipantResult<Vec<(Participant, Event)>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.event_id).collect();
        let mut events: HashMap<Uuid, Event> = self
            .events
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut paired: Vec<(Participant, Event)> = rows
            .into_iter()
            .filter_map(|row| {
                let event = events.remove(&row.event_id)?;
                Some((row, event))
            })
            .collect();
        paired.sort_by(|a, b| a.1.date.cmp(&b.1.date));
        Ok(paired)
    }

    fn send_invitation(&self, invitee: &UserSummary, event: &Event) {
        let Some(notifications) = &self.notifications else {
            return;
        };

        if let Err(e) =
            notifications.queue_invitation_email(&invitee.email, &invitee.name, &email_details(event))
        {
            tracing::warn!(invitee_id = %invitee.id, error = %e, "Failed to queue invitation email");
        }
    }
}

impl<R: ParticipantRepository> Clone for ParticipantService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            events: Arc::clone(&self.events),
            users: Arc::clone(&self.users),
            notifications: self.notifications.clone(),
        }
    }
}

#[async_trait]
impl<R: ParticipantRepository + 'static> ParticipationLookup for ParticipantService<R> {
    async fn joined_event_ids(
        &self,
        user_id: Uuid,
        event_ids: &[Uuid],
    ) -> EventResult<HashSet<Uuid>> {
        let wanted: HashSet<&Uuid> = event_ids.iter().collect();
        let rows = self
            .repository
            .list_by_user(user_id, Some(InvitationStatus::Accepted))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.event_id)
            .filter(|id| wanted.contains(id))
            .collect())
    }
}

#[async_trait]
impl<R: ParticipantRepository + 'static> EventApprovalHook for ParticipantService<R> {
    async fn on_event_approved(&self, event: &Event) {
        if let Err(e) = self.notify_approval(event).await {
            tracing::warn!(event_id = %event.id, error = %e, "Approval email sweep failed");
        }
    }
}

fn email_details(event: &Event) -> EventEmailDetails {
    EventEmailDetails {
        id: event.id,
        title: event.title.clone(),
        description: event.description.clone(),
        date: event.date,
        location: event.location.clone(),
    }
}

fn into_responses(pairs: Vec<(Participant, Event)>) -> Vec<InvitationResponse> {
    pairs
        .into_iter()
        .map(|(row, event)| InvitationResponse::new(row, &event))
        .collect()
}
