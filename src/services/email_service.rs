//! Transactional notifications rendered from embedded templates.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{debug, warn};

use super::mailer::{EmailError, Mailer, OutgoingEmail};
use crate::config::EmailConfig;
use crate::models::{Contact, User};

const TEMPLATES: &[(&str, &str)] = &[
    (
        "account_created.subject",
        "Welcome, {{ username }}",
    ),
    (
        "account_created.txt",
        "Hello {{ username }},

Your account has been created with the role {{ role }}.
You can sign in at {{ site_url }}.
",
    ),
    (
        "account_updated.subject",
        "Your account was updated",
    ),
    (
        "account_updated.txt",
        "Hello {{ username }},

Your account details were changed on {{ at }}.
If this was not you, reset your password at {{ site_url }}.
",
    ),
    (
        "account_deleted.subject",
        "Your account was deleted",
    ),
    (
        "account_deleted.txt",
        "Hello {{ username }},

Your account and its sessions have been removed.
",
    ),
    (
        "contact_created.subject",
        "Thanks for getting in touch",
    ),
    (
        "contact_created.txt",
        "Hello {{ name }},

Thanks for your message. It has been received and you will hear back soon.
{% if message %}
Your message:
{{ message }}
{% endif %}",
    ),
    (
        "contact_received.subject",
        "New contact from {{ name }}",
    ),
    (
        "contact_received.txt",
        "A new contact form was submitted.

Name: {{ name }}
Email: {{ email }}
Phone: {{ phone }}
{% if message %}
{{ message }}
{% endif %}",
    ),
    (
        "contact_updated.subject",
        "Your contact details were updated",
    ),
    (
        "contact_updated.txt",
        "Hello {{ name }},

The contact details you submitted were updated on {{ at }}.
",
    ),
    (
        "contact_deleted.subject",
        "Your contact details were removed",
    ),
    (
        "contact_deleted.txt",
        "Hello {{ name }},

The contact details you submitted have been removed.
",
    ),
    (
        "forgot_password.subject",
        "Reset your password",
    ),
    (
        "forgot_password.txt",
        "Hello {{ username }},

Use this token to reset your password: {{ token }}

Or open {{ site_url }}/reset-password?token={{ token }}

The token expires at {{ expires_at }}. If you did not ask for a reset, ignore this email.
",
    ),
];

pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    templates: Tera,
    config: EmailConfig,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, config: EmailConfig) -> Result<Self, EmailError> {
        let mut templates = Tera::default();
        templates.autoescape_on(vec![]);
        templates
            .add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| EmailError::Template(e.to_string()))?;

        Ok(Self {
            mailer,
            templates,
            config,
        })
    }

    pub async fn account_created(&self, user: &User) {
        let mut ctx = self.base_context();
        ctx.insert("username", &user.username);
        ctx.insert("role", &user.role.to_string());
        self.deliver("account_created", &user.email, &ctx).await;
    }

    pub async fn account_updated(&self, user: &User) {
        let mut ctx = self.base_context();
        ctx.insert("username", &user.username);
        self.deliver("account_updated", &user.email, &ctx).await;
    }

    pub async fn account_deleted(&self, user: &User) {
        let mut ctx = self.base_context();
        ctx.insert("username", &user.username);
        self.deliver("account_deleted", &user.email, &ctx).await;
    }

    /// Acknowledges the submitter and, when configured, notifies the owner.
    pub async fn contact_created(&self, contact: &Contact) {
        let ctx = self.contact_context(contact);
        self.deliver("contact_created", &contact.email, &ctx).await;

        if let Some(owner) = self.config.owner_address.as_deref() {
            self.deliver("contact_received", owner, &ctx).await;
        }
    }

    pub async fn contact_updated(&self, contact: &Contact) {
        let ctx = self.contact_context(contact);
        self.deliver("contact_updated", &contact.email, &ctx).await;
    }

    pub async fn contact_deleted(&self, contact: &Contact) {
        let ctx = self.contact_context(contact);
        self.deliver("contact_deleted", &contact.email, &ctx).await;
    }

    pub async fn forgot_password(&self, user: &User, token: &str, expires_at: DateTime<Utc>) {
        let mut ctx = self.base_context();
        ctx.insert("username", &user.username);
        ctx.insert("token", token);
        ctx.insert("expires_at", &expires_at.to_rfc3339());
        self.deliver("forgot_password", &user.email, &ctx).await;
    }

    fn base_context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("site_url", self.config.site_url.trim_end_matches('/'));
        ctx.insert("at", &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string());
        ctx
    }

    fn contact_context(&self, contact: &Contact) -> Context {
        let mut ctx = self.base_context();
        ctx.insert("name", contact.name.as_deref().unwrap_or("there"));
        ctx.insert("email", &contact.email);
        ctx.insert("phone", contact.phone.as_deref().unwrap_or("-"));
        ctx.insert("message", &contact.message);
        ctx
    }

    fn render(&self, template: &str, to: &str, ctx: &Context) -> Result<OutgoingEmail, EmailError> {
        let subject = self
            .templates
            .render(&format!("{template}.subject"), ctx)
            .map_err(|e| EmailError::Template(e.to_string()))?;
        let body = self
            .templates
            .render(&format!("{template}.txt"), ctx)
            .map_err(|e| EmailError::Template(e.to_string()))?;

        Ok(OutgoingEmail {
            to: to.to_string(),
            subject: subject.trim().to_string(),
            body,
        })
    }

    /// Failures are logged; notifications never fail the caller.
    async fn deliver(&self, template: &str, to: &str, ctx: &Context) {
        let email = match self.render(template, to, ctx) {
            Ok(email) => email,
            Err(e) => {
                warn!(template, error = %e, "Failed to render email");
                return;
            }
        };

        debug!(template, to, "Sending email");
        if let Err(e) = self.mailer.send(email).await {
            warn!(template, to, error = %e, "Failed to send email");
        }
    }
}
