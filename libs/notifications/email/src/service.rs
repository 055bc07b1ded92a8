//! High-level API used by the domain services.
//!
//! Every `queue_*` method renders a template and hands the message to the
//! [`EmailDispatcher`]. None of them wait for delivery.

use crate::dispatcher::EmailDispatcher;
use crate::error::NotificationResult;
use crate::models::Email;
use crate::templates::{
    EMAIL_VERIFICATION, EVENT_APPROVED, EVENT_INVITATION, PASSWORD_RESET, TemplateEngine,
};
use chrono::{DateTime, Utc};
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const VERIFICATION_EXPIRY_HOURS: u32 = 24;
const PASSWORD_RESET_EXPIRY_HOURS: u32 = 1;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Base URL of the web frontend, used for reset and invitation links
    pub frontend_url: String,
    /// Public URL of this API, used for the verification link
    pub api_base_url: String,
    pub app_name: String,
    /// Retries per email after the first failed send
    pub max_retries: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            app_name: "EventHub".to_string(),
            max_retries: 3,
        }
    }
}

impl FromEnv for NotificationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            frontend_url: trim_slash(env_or_default("FRONTEND_URL", &defaults.frontend_url)),
            api_base_url: trim_slash(env_or_default("API_BASE_URL", &defaults.api_base_url)),
            app_name: env_or_default("EMAIL_FROM_NAME", &defaults.app_name),
            max_retries: env_parse_or("EMAIL_MAX_RETRIES", defaults.max_retries)?,
        })
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// The parts of an event that appear in invitation and approval emails
#[derive(Debug, Clone)]
pub struct EventEmailDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

#[derive(Clone)]
pub struct NotificationService {
    dispatcher: EmailDispatcher,
    templates: Arc<TemplateEngine>,
    config: NotificationConfig,
}

impl NotificationService {
    pub fn new(dispatcher: EmailDispatcher, config: NotificationConfig) -> NotificationResult<Self> {
        Ok(Self {
            dispatcher,
            templates: Arc::new(TemplateEngine::new()?),
            config,
        })
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &EmailDispatcher {
        &self.dispatcher
    }

    pub fn queue_verification_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> NotificationResult<()> {
        let link = format!("{}/api/users/verify-email/{}", self.config.api_base_url, token);
        self.queue(
            to,
            EMAIL_VERIFICATION,
            json!({
                "app_name": self.config.app_name,
                "name": name,
                "verification_link": link,
                "expiry_hours": VERIFICATION_EXPIRY_HOURS,
            }),
        )
    }

    pub fn queue_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> NotificationResult<()> {
        let link = format!("{}/reset-password/{}", self.config.frontend_url, token);
        self.queue(
            to,
            PASSWORD_RESET,
            json!({
                "app_name": self.config.app_name,
                "name": name,
                "reset_link": link,
                "expiry_hours": PASSWORD_RESET_EXPIRY_HOURS,
            }),
        )
    }

    pub fn queue_invitation_email(
        &self,
        to: &str,
        name: &str,
        event: &EventEmailDetails,
    ) -> NotificationResult<()> {
        let mut data = self.event_data(name, event);
        data["invitations_link"] = json!(format!("{}/invitations", self.config.frontend_url));
        self.queue(to, EVENT_INVITATION, data)
    }

    pub fn queue_event_approved_email(
        &self,
        to: &str,
        name: &str,
        event: &EventEmailDetails,
    ) -> NotificationResult<()> {
        let mut data = self.event_data(name, event);
        data["event_link"] = json!(format!("{}/events/{}", self.config.frontend_url, event.id));
        self.queue(to, EVENT_APPROVED, data)
    }

    fn event_data(&self, name: &str, event: &EventEmailDetails) -> Value {
        json!({
            "app_name": self.config.app_name,
            "name": name,
            "event_title": event.title,
            "event_description": event.description,
            "event_date": event.date.format("%Y-%m-%d %H:%M UTC").to_string(),
            "event_location": event.location,
        })
    }

    fn queue(&self, to: &str, template: &str, data: Value) -> NotificationResult<()> {
        let rendered = self.templates.render(template, &data)?;

        let email = Email::new(to, rendered.subject)
            .with_text(rendered.body_text)
            .with_html(rendered.body_html)
            .with_template_name(template)
            .with_max_retries(self.config.max_retries);

        debug!(to = %to, template = %template, "Rendered email");
        self.dispatcher.enqueue(email)
    }
}
