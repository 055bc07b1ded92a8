//! Users Domain
//!
//! Accounts, credentials and the tokens that go with them.
//!
//! - Registration with an emailed verification link
//! - Login gated on a verified email, issuing a 7 day session token
//! - Password reset by emailed token
//! - Profile read/update for the session user
//!
//! [`UserService`] also implements [`axum_helpers::IdentityResolver`] for the
//! session middleware and [`UserDirectory`] for domains that display users.
//!
//! ```rust,ignore
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let service = UserService::new(InMemoryUserRepository::new(), jwt)
//!     .with_notifications(notifications);
//! let router = handlers::router(service);
//! ```

pub mod directory;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use directory::UserDirectory;
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    LoginRequest, LoginResponse, RegisterRequest, Role, UpdateProfile, User, UserResponse,
    UserSummary,
};
pub use mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
