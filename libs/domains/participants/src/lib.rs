//! Participants Domain
//!
//! One row per (event, user) pair, created either by the user joining
//! (`accepted`) or by the event owner inviting them (`pending`).
//!
//! ```text
//! invite ──► pending ──► accepted
//!                   └──► declined
//! join   ──► accepted
//! leave  ──► (row deleted, rejoin allowed)
//! ```
//!
//! [`ParticipantService`] also plugs into the events domain: it answers
//! `hasJoined` lookups and, once an event is approved, emails every invitee
//! and participant of it.
//!
//! ```rust,ignore
//! use domain_participants::{handlers, MongoParticipantRepository, ParticipantService};
//!
//! let participants = ParticipantService::new(MongoParticipantRepository::new(&db), events, users)
//!     .with_notifications(notifications);
//! let app = Router::new()
//!     .nest("/participants", handlers::router(participants.clone()))
//!     .nest("/invitations", handlers::invitations_router(participants));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{ParticipantError, ParticipantResult};
pub use handlers::{ApiDoc, InvitationsApiDoc};
pub use models::{
    EventSummary, InvitationResponse, InvitationStatus, InviteUser, Participant,
    ParticipantResponse,
};
pub use mongodb::MongoParticipantRepository;
pub use repository::{InMemoryParticipantRepository, ParticipantRepository};
pub use service::ParticipantService;
