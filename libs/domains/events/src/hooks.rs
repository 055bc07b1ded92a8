//! Seams where the participation domain plugs into the event lifecycle.

use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::EventResult;
use crate::models::Event;

/// Answers "has this user joined these events?" for `hasJoined`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipationLookup: Send + Sync {
    /// The subset of `event_ids` where `user_id` holds an accepted participation
    async fn joined_event_ids(&self, user_id: Uuid, event_ids: &[Uuid])
    -> EventResult<HashSet<Uuid>>;
}

/// Runs after an event moves to `approved`.
///
/// Implementations handle their own failures; the approval is already
/// stored when this is called.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventApprovalHook: Send + Sync {
    async fn on_event_approved(&self, event: &Event);
}
