//! Handlebars templates for every message EventHub sends.
//!
//! Each template has a subject, a plain-text body and an HTML body, all
//! rendered from the same JSON data.

use crate::error::{NotificationError, NotificationResult};
use handlebars::Handlebars;
use serde_json::Value;
use std::collections::HashSet;

pub const EMAIL_VERIFICATION: &str = "email_verification";
pub const PASSWORD_RESET: &str = "password_reset";
pub const EVENT_INVITATION: &str = "event_invitation";
pub const EVENT_APPROVED: &str = "event_approved";

#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

struct TemplateSource {
    name: &'static str,
    subject: &'static str,
    text: &'static str,
    html: &'static str,
}

const DEFAULTS: &[TemplateSource] = &[
    TemplateSource {
        name: EMAIL_VERIFICATION,
        subject: "Verify your email for {{app_name}}",
        text: r#"Hello {{name}},

Please verify your email address by opening the link below:

{{verification_link}}

This link expires in {{expiry_hours}} hours.

If you didn't create an account, you can ignore this email.

The {{app_name}} Team"#,
        html: r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">Verify Your Email</h1>
    <p>Hello {{name}},</p>
    <p>Please verify your email address by clicking the button below:</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{verification_link}}"
           style="background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">
            Verify Email
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">This link expires in {{expiry_hours}} hours.</p>
    <p>The {{app_name}} Team</p>
</body>
</html>"#,
    },
    TemplateSource {
        name: PASSWORD_RESET,
        subject: "Password Reset Request",
        text: r#"Hello {{name}},

We received a request to reset your password. Open the link below to choose a new one:

{{reset_link}}

This link expires in {{expiry_hours}} hour(s).

If you didn't request this, ignore this email. Your password will remain unchanged.

The {{app_name}} Team"#,
        html: r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">Password Reset</h1>
    <p>Hello {{name}},</p>
    <p>We received a request to reset your password.</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{reset_link}}"
           style="background-color: #dc2626; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">
            Reset Password
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">This link expires in {{expiry_hours}} hour(s).</p>
    <p style="color: #666; font-size: 14px;">If you didn't request this, ignore this email.</p>
    <p>The {{app_name}} Team</p>
</body>
</html>"#,
    },
    TemplateSource {
        name: EVENT_INVITATION,
        subject: "You're Invited to {{event_title}}",
        text: r#"Hello {{name}},

You have been invited to {{event_title}}.

When: {{event_date}}
Where: {{event_location}}

{{event_description}}

Review your invitations here: {{invitations_link}}

The {{app_name}} Team"#,
        html: r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">You're Invited!</h1>
    <p>Hello {{name}},</p>
    <p>You have been invited to <strong>{{event_title}}</strong>.</p>
    <ul>
        <li><strong>When:</strong> {{event_date}}</li>
        <li><strong>Where:</strong> {{event_location}}</li>
    </ul>
    <p>{{event_description}}</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{invitations_link}}"
           style="background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">
            View Invitation
        </a>
    </p>
    <p>The {{app_name}} Team</p>
</body>
</html>"#,
    },
    TemplateSource {
        name: EVENT_APPROVED,
        subject: "{{event_title}} has been approved",
        text: r#"Hello {{name}},

Good news: {{event_title}} has been approved and is going ahead.

When: {{event_date}}
Where: {{event_location}}

Event details: {{event_link}}

The {{app_name}} Team"#,
        html: r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #16a34a;">Event Approved</h1>
    <p>Hello {{name}},</p>
    <p><strong>{{event_title}}</strong> has been approved and is going ahead.</p>
    <ul>
        <li><strong>When:</strong> {{event_date}}</li>
        <li><strong>Where:</strong> {{event_location}}</li>
    </ul>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{event_link}}"
           style="background-color: #16a34a; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">
            View Event
        </a>
    </p>
    <p>The {{app_name}} Team</p>
</body>
</html>"#,
    },
];

/// Handlebars-based template engine
///
/// Strict mode is on: a template that references a missing field fails to
/// render instead of silently producing an empty string.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    names: HashSet<&'static str>,
}

impl TemplateEngine {
    /// Create an engine with all EventHub templates registered
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        let mut names = HashSet::new();
        for source in DEFAULTS {
            for (part, body) in [
                ("subject", source.subject),
                ("text", source.text),
                ("html", source.html),
            ] {
                handlebars
                    .register_template_string(&format!("{}_{}", source.name, part), body)
                    .map_err(|e| {
                        NotificationError::Template(format!(
                            "Failed to register {} {}: {}",
                            source.name, part, e
                        ))
                    })?;
            }
            names.insert(source.name);
        }

        Ok(Self { handlebars, names })
    }

    pub fn render(&self, name: &str, data: &Value) -> NotificationResult<RenderedTemplate> {
        if !self.has_template(name) {
            return Err(NotificationError::Template(format!(
                "Template not found: {}",
                name
            )));
        }

        let render = |part: &str| {
            self.handlebars
                .render(&format!("{}_{}", name, part), data)
                .map_err(|e| {
                    NotificationError::Template(format!("Failed to render {} {}: {}", name, part, e))
                })
        };

        Ok(RenderedTemplate {
            subject: render("subject")?,
            body_text: render("text")?,
            body_html: render("html")?,
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
