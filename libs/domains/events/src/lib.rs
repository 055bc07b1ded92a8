//! Events Domain
//!
//! Community events that go live only after an admin approves them.
//!
//! ```text
//! create ──► pending ──► approved ──► approval hooks (emails)
//!                   └──► rejected
//! ```
//!
//! Listings are public, filterable and paginated. Owner summaries come from
//! a [`domain_users::UserDirectory`]; `hasJoined` comes from a
//! [`ParticipationLookup`]. Both are optional so the domain can be used alone.
//!
//! ```rust,ignore
//! use domain_events::{handlers, EventService, MongoEventRepository};
//!
//! let service = EventService::new(MongoEventRepository::new(&db))
//!     .with_user_directory(users)
//!     .with_participation(participants.clone())
//!     .with_approval_hook(participants);
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{EventError, EventResult};
pub use handlers::ApiDoc;
pub use hooks::{EventApprovalHook, ParticipationLookup};
pub use models::{
    CreateEvent, Event, EventFilter, EventPage, EventQuery, EventResponse, EventStatus,
    MAX_PAGE, Pagination, UpdateEvent,
};
pub use mongodb::MongoEventRepository;
pub use repository::{EventRepository, InMemoryEventRepository};
pub use service::EventService;
