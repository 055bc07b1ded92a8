use axum_helpers::JwtAuth;
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use email::{DispatcherConfig, EmailDispatcher, EmailProvider, NotificationService, SmtpProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());
    info!(database = config.mongodb.database(), "Connected to MongoDB");

    api::init_indexes(&db).await?;

    let provider: Arc<dyn EmailProvider> = Arc::new(SmtpProvider::from_env()?);
    info!(provider = provider.name(), "Email provider configured");
    let dispatcher = EmailDispatcher::spawn(provider, DispatcherConfig::default());
    let notifications = NotificationService::new(dispatcher.clone(), config.notifications.clone())?;

    let state = AppState {
        jwt: JwtAuth::new(&config.jwt),
        config,
        mongo_client,
        db,
        dispatcher,
        notifications,
    };

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router.merge(health_router(state.config.app));

    info!("Starting EventHub API with graceful shutdown (30s timeout)");

    let AppState {
        config,
        mongo_client,
        dispatcher,
        ..
    } = state;

    create_production_app(
        app,
        &config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: flushing queued emails");
            dispatcher.flush().await;
            drop(mongo_client);
            info!("Email queue drained, MongoDB connection closed");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("EventHub API shutdown complete");
    Ok(())
}
