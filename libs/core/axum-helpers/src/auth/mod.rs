//! Authentication and authorization.
//!
//! - [`JwtAuth`] signs and verifies HS256 tokens scoped to a [`TokenPurpose`]
//! - [`authenticate`] turns a bearer session token into a request-scoped [`AuthUser`]
//! - [`AuthUser`] / [`AdminUser`] extractors gate handlers
//!
//! ```ignore
//! let auth = AuthState::new(JwtAuth::new(&JwtConfig::from_env()?), Arc::new(user_service));
//!
//! let app = Router::new()
//!     .merge(api_routes)
//!     .layer(axum::middleware::from_fn_with_state(auth, authenticate));
//! ```

pub mod config;
pub mod identity;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use identity::{ADMIN_ROLE, AdminUser, AuthUser};
pub use jwt::{JwtAuth, JwtClaims, TokenError, TokenPurpose};
pub use middleware::{AuthState, IdentityResolver, authenticate, extract_bearer_token};
