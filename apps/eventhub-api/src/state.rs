//! Application state management.
//!
//! Shared handles passed to the route builders. Domain services are built
//! from these once, in [`crate::api::routes`].

use axum_helpers::JwtAuth;
use email::{EmailDispatcher, NotificationService};
use mongodb::{Client, Database};

/// Cloned into the readiness handler; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    pub db: Database,
    pub jwt: JwtAuth,
    /// Queue handle; flushed on shutdown
    pub dispatcher: EmailDispatcher,
    pub notifications: NotificationService,
}
