//! Participants and invitations API routes

use axum::Router;
use domain_events::MongoEventRepository;
use domain_participants::{MongoParticipantRepository, ParticipantService, handlers};
use std::sync::Arc;
use tracing::info;

use super::users::Users;
use crate::state::AppState;

pub type Participants = ParticipantService<MongoParticipantRepository>;

pub fn service(state: &AppState, users: &Users) -> Participants {
    ParticipantService::new(
        MongoParticipantRepository::new(&state.db),
        Arc::new(MongoEventRepository::new(&state.db)),
        Arc::new(users.clone()),
    )
    .with_notifications(state.notifications.clone())
}

pub fn router(service: Participants) -> Router {
    handlers::router(service)
}

pub fn invitations_router(service: Participants) -> Router {
    handlers::invitations_router(service)
}

pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoParticipantRepository::new(db)
        .ensure_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create participant indexes: {}", e))?;
    info!("Participant collection indexes created");
    Ok(())
}
