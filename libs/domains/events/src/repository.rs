use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{Event, EventFilter, Pagination};

/// Repository trait for Event persistence
///
/// Listings are ordered by `date` ascending, ties broken by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: Event) -> EventResult<Event>;

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>>;

    /// Events matching `ids`. Unknown ids are skipped.
    async fn get_by_ids(&self, ids: &[Uuid]) -> EventResult<Vec<Event>>;

    async fn list(&self, filter: &EventFilter, pagination: Pagination) -> EventResult<Vec<Event>>;

    async fn count(&self, filter: &EventFilter) -> EventResult<u64>;

    /// Every event owned by `owner`, unpaginated
    async fn list_by_owner(&self, owner: Uuid) -> EventResult<Vec<Event>>;

    /// Replace a stored event. `NotFound` if it does not exist.
    async fn update(&self, event: Event) -> EventResult<Event>;

    /// `false` if there was nothing to delete
    async fn delete(&self, id: Uuid) -> EventResult<bool>;
}

/// In-memory implementation of EventRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, filter: &EventFilter) -> Vec<Event> {
        let mut result: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        result
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: Event) -> EventResult<Event> {
        self.events.write().await.insert(event.id, event.clone());
        tracing::info!(event_id = %event.id, "Created event");
        Ok(event)
    }

    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> EventResult<Vec<Event>> {
        let events = self.events.read().await;
        Ok(ids.iter().filter_map(|id| events.get(id).cloned()).collect())
    }

    async fn list(&self, filter: &EventFilter, pagination: Pagination) -> EventResult<Vec<Event>> {
        Ok(self
            .matching(filter)
            .await
            .into_iter()
            .skip(pagination.skip() as usize)
            .take(pagination.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &EventFilter) -> EventResult<u64> {
        Ok(self.matching(filter).await.len() as u64)
    }

    async fn list_by_owner(&self, owner: Uuid) -> EventResult<Vec<Event>> {
        Ok(self.matching(&EventFilter::owned_by(owner)).await)
    }

    async fn update(&self, event: Event) -> EventResult<Event> {
        let mut events = self.events.write().await;

        if !events.contains_key(&event.id) {
            return Err(EventError::NotFound(event.id));
        }

        events.insert(event.id, event.clone());
        tracing::info!(event_id = %event.id, "Updated event");
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let removed = self.events.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(event_id = %id, "Deleted event");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEvent, EventStatus};
    use chrono::{Duration, Utc};

    fn event_in(days: i64) -> Event {
        Event::new(
            CreateEvent {
                title: format!("Event in {} days", days),
                description: "desc".to_string(),
                location: "Berlin".to_string(),
                date: Utc::now() + Duration::days(days),
            },
            Uuid::now_v7(),
        )
    }

    #[tokio::test]
    async fn test_list_sorted_by_date_and_paginated() {
        let repo = InMemoryEventRepository::new();
        for days in [5, 1, 3, 2, 4] {
            repo.create(event_in(days)).await.unwrap();
        }

        let page = repo
            .list(&EventFilter::default(), Pagination::new(Some(2), Some(2)))
            .await
            .unwrap();

        let titles: Vec<_> = page.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Event in 3 days", "Event in 4 days"]);
    }

    #[tokio::test]
    async fn test_count_applies_filter() {
        let repo = InMemoryEventRepository::new();
        let mut approved = event_in(1);
        approved.status = EventStatus::Approved;
        repo.create(approved).await.unwrap();
        repo.create(event_in(2)).await.unwrap();

        assert_eq!(repo.count(&EventFilter::pending()).await.unwrap(), 1);
        assert_eq!(repo.count(&EventFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryEventRepository::new();
        let result = repo.update(event_in(1)).await;
        assert!(matches!(result, Err(EventError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let repo = InMemoryEventRepository::new();
        let event = repo.create(event_in(1)).await.unwrap();

        assert!(repo.delete(event.id).await.unwrap());
        assert!(!repo.delete(event.id).await.unwrap());
    }
}
