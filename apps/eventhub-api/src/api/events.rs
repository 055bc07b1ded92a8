//! Events API routes
//!
//! The event service reads owners from the users domain, `hasJoined` from
//! the participants domain, and hands approvals to the participants domain
//! for the email sweep.

use axum::Router;
use domain_events::{EventService, MongoEventRepository, handlers};
use std::sync::Arc;
use tracing::info;

use super::participants::Participants;
use super::users::Users;
use crate::state::AppState;

pub fn router(state: &AppState, users: &Users, participants: &Participants) -> Router {
    let participants = Arc::new(participants.clone());

    let service = EventService::new(MongoEventRepository::new(&state.db))
        .with_user_directory(Arc::new(users.clone()))
        .with_participation(participants.clone())
        .with_approval_hook(participants);

    handlers::router(service)
}

pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoEventRepository::new(db)
        .ensure_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create event indexes: {}", e))?;
    info!("Event collection indexes created");
    Ok(())
}
