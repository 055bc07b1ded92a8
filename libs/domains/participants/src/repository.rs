use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ParticipantError, ParticipantResult};
use crate::models::{InvitationStatus, Participant};

/// Repository trait for Participant persistence
///
/// Listings are ordered by `joined_at` ascending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// `Duplicate` if a row for the same (event, user) pair exists
    async fn create(&self, participant: Participant) -> ParticipantResult<Participant>;

    async fn get_by_id(&self, id: Uuid) -> ParticipantResult<Option<Participant>>;

    async fn find(&self, event_id: Uuid, user_id: Uuid) -> ParticipantResult<Option<Participant>>;

    async fn list_by_event(&self, event_id: Uuid) -> ParticipantResult<Vec<Participant>>;

    /// Rows of one user, optionally restricted to one status
    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> ParticipantResult<Vec<Participant>>;

    /// Move a `pending` row to `status`. The check and the write are one
    /// step, so a row that is already accepted or declined stays as it is
    /// and yields `ParticipantError::not_pending`. `InvitationNotFound` if
    /// the row is gone.
    async fn update_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
    ) -> ParticipantResult<Participant>;

    /// `false` if there was nothing to delete
    async fn delete(&self, id: Uuid) -> ParticipantResult<bool>;
}

/// In-memory implementation of ParticipantRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryParticipantRepository {
    participants: Arc<RwLock<HashMap<Uuid, Participant>>>,
}

impl InMemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(&self, predicate: impl Fn(&Participant) -> bool) -> Vec<Participant> {
        let mut rows: Vec<Participant> = self
            .participants
            .read()
            .await
            .values()
            .filter(|p| predicate(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        rows
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn create(&self, participant: Participant) -> ParticipantResult<Participant> {
        let mut participants = self.participants.write().await;

        if participants
            .values()
            .any(|p| p.event_id == participant.event_id && p.user_id == participant.user_id)
        {
            return Err(ParticipantError::Duplicate);
        }

        participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn get_by_id(&self, id: Uuid) -> ParticipantResult<Option<Participant>> {
        Ok(self.participants.read().await.get(&id).cloned())
    }

    async fn find(&self, event_id: Uuid, user_id: Uuid) -> ParticipantResult<Option<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .values()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_by_event(&self, event_id: Uuid) -> ParticipantResult<Vec<Participant>> {
        Ok(self.select(|p| p.event_id == event_id).await)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> ParticipantResult<Vec<Participant>> {
        Ok(self
            .select(|p| p.user_id == user_id && status.is_none_or(|s| s == p.invitation_status))
            .await)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
    ) -> ParticipantResult<Participant> {
        let mut participants = self.participants.write().await;
        let participant = participants
            .get_mut(&id)
            .ok_or(ParticipantError::InvitationNotFound)?;

        if participant.invitation_status != InvitationStatus::Pending {
            return Err(ParticipantError::not_pending(participant.invitation_status));
        }

        participant.invitation_status = status;
        participant.updated_at = chrono::Utc::now();
        Ok(participant.clone())
    }

    async fn delete(&self, id: Uuid) -> ParticipantResult<bool> {
        Ok(self.participants.write().await.remove(&id).is_some())
    }
}
