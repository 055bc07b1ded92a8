use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::mongodb::MongoConfig;
use email::NotificationConfig;

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the libraries
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            mongodb: MongoConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            notifications: NotificationConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_jwt_secret() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some("a-perfectly-fine-secret-of-32-chars!")),
                ("APP_ENV", Some("production")),
                ("FRONTEND_URL", Some("https://events.example.com")),
                ("EMAIL_MAX_RETRIES", Some("5")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment.is_production());
                assert_eq!(config.app.name, "eventhub_api");
                assert_eq!(config.notifications.frontend_url, "https://events.example.com");
                assert_eq!(config.notifications.max_retries, 5);
            },
        );
    }
}
