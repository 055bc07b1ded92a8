//! # Axum Helpers
//!
//! Shared HTTP plumbing for the EventHub services.
//!
//! - **[`auth`]**: purpose-scoped JWTs, the session middleware and the
//!   `AuthUser`/`AdminUser` extractors
//! - **[`server`]**: router assembly with OpenAPI docs, health, graceful shutdown
//! - **[`http`]**: security headers middleware
//! - **[`errors`]**: `AppError` and the JSON error envelope
//! - **[`extractors`]**: `UuidPath`, `ValidatedJson` and `ValidatedQuery`
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router};
//!
//! let router = create_router::<ApiDoc>(api_routes).await?;
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use auth::{
    AdminUser, AuthState, AuthUser, IdentityResolver, JwtAuth, JwtClaims, JwtConfig, TokenPurpose,
    authenticate,
};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{UuidPath, ValidatedJson, ValidatedQuery};
pub use http::security_headers;
pub use response::MessageResponse;
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks,
};
