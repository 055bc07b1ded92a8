//! Users API routes

use axum::Router;
use domain_users::{MongoUserRepository, UserService, handlers};
use tracing::info;

use crate::state::AppState;

pub type Users = UserService<MongoUserRepository>;

pub fn service(state: &AppState) -> Users {
    UserService::new(MongoUserRepository::new(&state.db), state.jwt.clone())
        .with_notifications(state.notifications.clone())
}

pub fn router(service: Users) -> Router {
    handlers::router(service)
}

pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoUserRepository::new(db)
        .ensure_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create user indexes: {}", e))?;
    info!("User collection indexes created");
    Ok(())
}
