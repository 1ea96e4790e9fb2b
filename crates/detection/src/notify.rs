//! Notification delivery boundary.
//!
//! The pipeline treats delivery as an external capability behind
//! [`NotificationDispatcher`]: the orchestrator hands over an event and a
//! channel name, and records the outcome on the response row. Delivery is
//! best effort; nothing here is retried.
//!
//! [`SmtpNotifier`] handles the `email` channel via the `lettre` async
//! SMTP transport, configured from environment variables. Channels the
//! deployment has no integration for are acknowledged and logged rather
//! than failed, so a config listing `sms` does not poison every response.

use async_trait::async_trait;

use helioguard_core::channels::CHANNEL_EMAIL;
use helioguard_db::models::tamper_event::TamperEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// Dispatcher trait
// ---------------------------------------------------------------------------

/// Delivery channel abstraction for tamper notifications.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a notification about `event` through `channel`.
    async fn send(&self, event: &TamperEvent, channel: &str) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@helioguard.local";

/// Default operations inbox when `ALERT_EMAIL_TO` is not set.
const DEFAULT_TO_ADDRESS: &str = "ops@helioguard.local";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Operations inbox that receives tamper alerts.
    pub to_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and the log-only notifier should be used.
    ///
    /// | Variable         | Required | Default                   |
    /// |------------------|----------|---------------------------|
    /// | `SMTP_HOST`      | yes      | —                         |
    /// | `SMTP_PORT`      | no       | `587`                     |
    /// | `SMTP_FROM`      | no       | `noreply@helioguard.local`|
    /// | `ALERT_EMAIL_TO` | no       | `ops@helioguard.local`    |
    /// | `SMTP_USER`      | no       | —                         |
    /// | `SMTP_PASSWORD`  | no       | —                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            to_address: std::env::var("ALERT_EMAIL_TO")
                .unwrap_or_else(|_| DEFAULT_TO_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

/// Sends tamper alert emails via SMTP.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn deliver_email(&self, event: &TamperEvent) -> Result<(), NotifyError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let subject = format!(
            "[Helioguard] {} tamper alert: {}",
            event.severity, event.event_type
        );
        let body = format!(
            "Installation: {}\nEvent: {}\nSeverity: {}\nConfidence: {}\nTime: {}\n\n{}",
            event.installation_id,
            event.event_type,
            event.severity,
            event.confidence_score,
            event.occurred_at,
            event.description
        );

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.config.to_address.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            event_id = event.id,
            to = %self.config.to_address,
            "Tamper alert email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for SmtpNotifier {
    async fn send(&self, event: &TamperEvent, channel: &str) -> Result<(), NotifyError> {
        match channel {
            CHANNEL_EMAIL => self.deliver_email(event).await,
            other => {
                tracing::debug!(
                    event_id = event.id,
                    channel = other,
                    "Channel delivery not implemented, skipping"
                );
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LogNotifier
// ---------------------------------------------------------------------------

/// Log-only dispatcher used when SMTP is unconfigured and in tests.
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn send(&self, event: &TamperEvent, channel: &str) -> Result<(), NotifyError> {
        tracing::info!(
            event_id = event.id,
            installation_id = event.installation_id,
            event_type = %event.event_type,
            severity = %event.severity,
            channel,
            "Tamper notification (log only)"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn notify_error_display_build() {
        let err = NotifyError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn notify_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = NotifyError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}
