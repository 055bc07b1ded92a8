//! API routes module
//!
//! Builds the domain services once and mounts their routers. Every route
//! sits behind the session middleware, which lets anonymous requests
//! through and leaves the per-route decision to the extractors.

pub mod events;
pub mod health;
pub mod participants;
pub mod users;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum_helpers::{AuthState, authenticate};
use std::sync::Arc;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let users = users::service(state);
    let participants = participants::service(state, &users);
    let auth = AuthState::new(state.jwt.clone(), Arc::new(users.clone()));

    Router::new()
        .nest("/users", users::router(users.clone()))
        .nest("/events", events::router(state, &users, &participants))
        .nest("/participants", participants::router(participants.clone()))
        .nest("/invitations", participants::invitations_router(participants))
        .layer(from_fn_with_state(auth, authenticate))
        .merge(health::router(state.clone()))
}

/// Create indexes backing uniqueness and the list queries
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    users::init_indexes(db).await?;
    events::init_indexes(db).await?;
    participants::init_indexes(db).await?;
    Ok(())
}
