//! Outbound email for EventHub.
//!
//! Requests never talk to the mail server. Services call
//! [`NotificationService`], which renders a template and enqueues the
//! message on the in-process [`EmailDispatcher`]. A single worker task
//! drains the queue, retrying failed sends with backoff and logging the
//! ones that never get through.
//!
//! ```ignore
//! use email::{EmailDispatcher, DispatcherConfig, NotificationConfig, NotificationService, SmtpProvider};
//!
//! let provider = Arc::new(SmtpProvider::from_env()?);
//! let dispatcher = EmailDispatcher::spawn(provider, DispatcherConfig::default());
//! let notifications = NotificationService::new(dispatcher.clone(), NotificationConfig::from_env()?)?;
//!
//! notifications.queue_verification_email("ada@example.com", "Ada", &token);
//! dispatcher.flush().await; // on shutdown
//! ```

pub mod dispatcher;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;
pub mod templates;

pub use dispatcher::{DispatcherConfig, EmailDispatcher};
pub use error::{NotificationError, NotificationResult};
pub use models::Email;
pub use provider::{EmailProvider, MockSmtpProvider, SendResult, SmtpConfig, SmtpProvider};
pub use service::{EventEmailDetails, NotificationConfig, NotificationService};
pub use templates::{RenderedTemplate, TemplateEngine};
