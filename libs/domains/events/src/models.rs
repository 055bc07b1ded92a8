//! Event domain models

use chrono::{DateTime, Utc};
use domain_users::UserSummary;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page whose offset still fits the i64 `skip` MongoDB stores.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// Approval state. `pending` is the only state with outgoing transitions.
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
pub enum EventStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Pending, EventStatus::Approved)
                | (EventStatus::Pending, EventStatus::Rejected)
        )
    }
}

/// Stored event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    /// Owner; never changes after creation
    pub created_by: Uuid,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(input: CreateEvent, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            location: input.location,
            date: input.date,
            created_by: owner,
            status: EventStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Status and owner are not touched.
    pub fn apply_update(&mut self, update: UpdateEvent) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        self.updated_at = Utc::now();
    }

    pub fn is_past(&self) -> bool {
        self.date < Utc::now()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,
    /// RFC 3339 timestamp
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Admin decision. Only `approved` and `rejected` are accepted; a missing
/// `status` is rejected by the service like any other value.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApproveEvent {
    #[serde(default)]
    pub status: String,
}

/// Optional predicates, all combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    /// Case-insensitive substring of location
    pub location: Option<String>,
    pub status: Option<EventStatus>,
    /// Inclusive lower bound on `date`
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date`
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}

impl EventFilter {
    pub fn pending() -> Self {
        Self {
            status: Some(EventStatus::Pending),
            ..Default::default()
        }
    }

    pub fn owned_by(owner: Uuid) -> Self {
        Self {
            created_by: Some(owner),
            ..Default::default()
        }
    }

    /// In-memory evaluation, mirroring the Mongo query
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !event.title.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !event
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != event.status) {
            return false;
        }
        if self.start_date.is_some_and(|start| event.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| event.date > end) {
            return false;
        }
        if self.created_by.is_some_and(|owner| owner != event.created_by) {
            return false;
        }
        true
    }
}

/// 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Missing or zero values take defaults. `page` is clamped to
    /// `1..=MAX_PAGE` and `limit` to at most `MAX_PAGE_SIZE`.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit
                .filter(|&l| l > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Query string for `GET /events`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    pub location: Option<String>,
    /// `pending`, `approved` or `rejected`
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based, default 1
    pub page: Option<u64>,
    /// Default 10, max 100
    pub limit: Option<u64>,
}

/// Query string for the paginated admin list
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        Pagination::new(query.page, query.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub status: EventStatus,
    pub created_by: Uuid,
    /// Owner display details, absent if the owner account is gone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    /// Whether the viewer has joined; only present for authenticated viewers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_joined: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            date: event.date,
            status: event.status,
            created_by: event.created_by,
            owner: None,
            has_joined: None,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// One page of events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub events: Vec<EventResponse>,
}
