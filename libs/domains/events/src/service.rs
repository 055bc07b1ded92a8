//! Event Service - Business logic layer

use axum_helpers::AuthUser;
use domain_users::UserDirectory;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, EventResult};
use crate::hooks::{EventApprovalHook, ParticipationLookup};
use crate::models::{
    CreateEvent, Event, EventFilter, EventPage, EventQuery, EventResponse, EventStatus,
    Pagination, UpdateEvent,
};
use crate::repository::EventRepository;

/// Event service providing business logic operations
///
/// Owner details and `hasJoined` are filled in only when a
/// [`UserDirectory`] and a [`ParticipationLookup`] are attached.
pub struct EventService<R: EventRepository> {
    repository: Arc<R>,
    users: Option<Arc<dyn UserDirectory>>,
    participation: Option<Arc<dyn ParticipationLookup>>,
    approval_hooks: Vec<Arc<dyn EventApprovalHook>>,
}

impl<R: EventRepository> EventService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Share one repository with other services
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self {
            repository,
            users: None,
            participation: None,
            approval_hooks: Vec::new(),
        }
    }

    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_participation(mut self, participation: Arc<dyn ParticipationLookup>) -> Self {
        self.participation = Some(participation);
        self
    }

    pub fn with_approval_hook(mut self, hook: Arc<dyn EventApprovalHook>) -> Self {
        self.approval_hooks.push(hook);
        self
    }

    /// New events always start `pending`
    #[instrument(skip(self, input, owner), fields(owner_id = %owner.id))]
    pub async fn create_event(
        &self,
        input: CreateEvent,
        owner: &AuthUser,
    ) -> EventResult<EventResponse> {
        input
            .validate()
            .map_err(|e| EventError::Validation(e.to_string()))?;

        let event = self.repository.create(Event::new(input, owner.id)).await?;

        tracing::info!(event_id = %event.id, title = %event.title, "Event created");
        self.enrich_one(event, None).await
    }

    #[instrument(skip(self, viewer))]
    pub async fn list_events(
        &self,
        query: EventQuery,
        viewer: Option<&AuthUser>,
    ) -> EventResult<EventPage> {
        let status = query
            .status
            .as_deref()
            .map(|s| {
                s.parse::<EventStatus>()
                    .map_err(|_| EventError::Validation(format!("Invalid status '{}'", s)))
            })
            .transpose()?;

        let filter = EventFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            location: query.location.filter(|s| !s.trim().is_empty()),
            status,
            start_date: query.start_date,
            end_date: query.end_date,
            created_by: None,
        };

        self.page(&filter, Pagination::new(query.page, query.limit), viewer)
            .await
    }

    /// Events waiting for an admin decision
    #[instrument(skip(self))]
    pub async fn list_pending(&self, pagination: Pagination) -> EventResult<EventPage> {
        self.page(&EventFilter::pending(), pagination, None).await
    }

    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn list_my_events(&self, owner: &AuthUser) -> EventResult<Vec<EventResponse>> {
        let events = self.repository.list_by_owner(owner.id).await?;
        self.enrich(events, Some(owner)).await
    }

    #[instrument(skip(self, viewer))]
    pub async fn get_event(&self, id: Uuid, viewer: Option<&AuthUser>) -> EventResult<EventResponse> {
        let event = self.find(id).await?;
        self.enrich_one(event, viewer).await
    }

    /// Owner or admin only
    #[instrument(skip(self, input, requester), fields(requester_id = %requester.id))]
    pub async fn update_event(
        &self,
        id: Uuid,
        input: UpdateEvent,
        requester: &AuthUser,
    ) -> EventResult<EventResponse> {
        let event = self.find(id).await?;
        ensure_can_modify(&event, requester, "update")?;
        self.apply_update(event, input).await
    }

    /// Owner or admin only
    #[instrument(skip(self, requester), fields(requester_id = %requester.id))]
    pub async fn delete_event(&self, id: Uuid, requester: &AuthUser) -> EventResult<()> {
        let event = self.find(id).await?;
        ensure_can_modify(&event, requester, "delete")?;
        self.remove(id).await
    }

    /// Admin edit without the ownership check
    #[instrument(skip(self, input))]
    pub async fn admin_update_event(&self, id: Uuid, input: UpdateEvent) -> EventResult<EventResponse> {
        let event = self.find(id).await?;
        self.apply_update(event, input).await
    }

    #[instrument(skip(self))]
    pub async fn admin_delete_event(&self, id: Uuid) -> EventResult<()> {
        self.find(id).await?;
        self.remove(id).await
    }

    /// Move a pending event to `approved` or `rejected`.
    ///
    /// On approval the registered hooks run after the new status is stored.
    #[instrument(skip(self))]
    pub async fn approve_event(&self, id: Uuid, decision: &str) -> EventResult<EventStatus> {
        let mut event = self.find(id).await?;

        let next = decision
            .parse::<EventStatus>()
            .ok()
            .filter(|s| *s != EventStatus::Pending)
            .ok_or(EventError::InvalidDecision)?;

        if !event.status.can_transition_to(next) {
            return Err(EventError::AlreadyDecided(event.status));
        }

        event.status = next;
        event.updated_at = chrono::Utc::now();
        let event = self.repository.update(event).await?;

        tracing::info!(event_id = %event.id, status = %next, "Admin decided event");

        if next == EventStatus::Approved {
            for hook in &self.approval_hooks {
                hook.on_event_approved(&event).await;
            }
        }

        Ok(next)
    }

    async fn find(&self, id: Uuid) -> EventResult<Event> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(EventError::NotFound(id))
    }

    async fn apply_update(&self, mut event: Event, input: UpdateEvent) -> EventResult<EventResponse> {
        input
            .validate()
            .map_err(|e| EventError::Validation(e.to_string()))?;

        event.apply_update(input);
        let event = self.repository.update(event).await?;

        tracing::info!(event_id = %event.id, "Event updated");
        self.enrich_one(event, None).await
    }

    async fn remove(&self, id: Uuid) -> EventResult<()> {
        if !self.repository.delete(id).await? {
            return Err(EventError::NotFound(id));
        }
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }

    async fn page(
        &self,
        filter: &EventFilter,
        pagination: Pagination,
        viewer: Option<&AuthUser>,
    ) -> EventResult<EventPage> {
        let total = self.repository.count(filter).await?;
        let events = self.repository.list(filter, pagination).await?;

        Ok(EventPage {
            total,
            page: pagination.page,
            page_size: pagination.limit,
            total_pages: pagination.total_pages(total),
            events: self.enrich(events, viewer).await?,
        })
    }

    async fn enrich_one(&self, event: Event, viewer: Option<&AuthUser>) -> EventResult<EventResponse> {
        let mut responses = self.enrich(vec![event], viewer).await?;
        responses
            .pop()
            .ok_or_else(|| EventError::Internal("Event lost during enrichment".to_string()))
    }

    /// Attach owner summaries and, for a known viewer, `hasJoined`
    async fn enrich(
        &self,
        events: Vec<Event>,
        viewer: Option<&AuthUser>,
    ) -> EventResult<Vec<EventResponse>> {
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();

        let owners = match &self.users {
            Some(users) => {
                let mut owner_ids: Vec<Uuid> = events.iter().map(|e| e.created_by).collect();
                owner_ids.sort_unstable();
                owner_ids.dedup();
                Some(users.find_summaries(&owner_ids).await?)
            }
            None => None,
        };

        let joined = match (&self.participation, viewer) {
            (Some(participation), Some(viewer)) => {
                Some(participation.joined_event_ids(viewer.id, &ids).await?)
            }
            _ => None,
        };

        Ok(events
            .into_iter()
            .map(|event| {
                let owner = owners
                    .as_ref()
                    .and_then(|o| o.get(&event.created_by).cloned());
                let has_joined = joined.as_ref().map(|j| j.contains(&event.id));

                let mut response = EventResponse::from(event);
                response.owner = owner;
                response.has_joined = has_joined;
                response
            })
            .collect())
    }
}

impl<R: EventRepository> Clone for EventService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            users: self.users.clone(),
            participation: self.participation.clone(),
            approval_hooks: self.approval_hooks.clone(),
        }
    }
}

fn ensure_can_modify(event: &Event, requester: &AuthUser, action: &'static str) -> EventResult<()> {
    if event.created_by == requester.id || requester.is_admin() {
        Ok(())
    } else {
        Err(EventError::Forbidden { action })
    }
}
