//! Read-only view of users for other domains.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::UserResult;
use crate::models::UserSummary;

/// Resolves user ids to display summaries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_summary(&self, id: Uuid) -> UserResult<Option<UserSummary>>;

    /// Summaries keyed by id. Ids with no matching user are absent.
    async fn find_summaries(&self, ids: &[Uuid]) -> UserResult<HashMap<Uuid, UserSummary>>;
}
