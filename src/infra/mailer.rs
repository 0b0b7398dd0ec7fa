//! Outbound email delivery.
//!
//! Transactional mail for the account lifecycle: invitation links and
//! password reset links. When SMTP is not configured (local development),
//! messages are logged instead of sent so the flows remain testable.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::env;

use crate::errors::{AppError, AppResult};

/// A transactional email ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an account invitation with its activation link.
    async fn send_invitation(&self, to: &str, name: &str, activation_link: &str) -> AppResult<()>;

    /// Send a password reset link.
    async fn send_password_reset(&self, to: &str, name: &str, reset_link: &str) -> AppResult<()>;
}

/// SMTP configuration from environment.
struct SmtpConfig {
    host: Option<String>,
    port: u16,
    user: Option<String>,
    pass: Option<String>,
    from: String,
}

impl SmtpConfig {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok(),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            user: env::var("SMTP_USER").ok(),
            pass: env::var("SMTP_PASS").ok(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@example.com".to_string()),
        }
    }

    fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}

/// SMTP-backed mailer. Falls back to logging when SMTP_HOST is unset.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn from_env() -> Self {
        Self {
            config: SmtpConfig::from_env(),
        }
    }

    async fn deliver(&self, message: EmailMessage) -> AppResult<()> {
        if !self.config.is_configured() {
            // Development mode: log the email instead of sending
            tracing::warn!("SMTP not configured - logging email instead of sending");
            tracing::info!(
                "=== EMAIL (not sent) ===\n\
                 From: {}\n\
                 To: {}\n\
                 Subject: {}\n\
                 Body:\n{}\n\
                 ========================",
                self.config.from,
                message.to,
                message.subject,
                message.body
            );
            return Ok(());
        }

        let host = self.config.host.as_deref().unwrap_or_default();

        let email = Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|e| AppError::email(format!("Invalid sender address: {}", e)))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| AppError::email(format!("Invalid recipient address: {}", e)))?)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| AppError::email(format!("Failed to build email: {}", e)))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| AppError::email(format!("SMTP relay error: {}", e)))?
            .port(self.config.port);

        if let (Some(user), Some(pass)) = (&self.config.user, &self.config.pass) {
            transport = transport.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport
            .build()
            .send(email)
            .await
            .map_err(|e| AppError::email(format!("SMTP send failed: {}", e)))?;

        tracing::info!(to = %message.to, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_invitation(&self, to: &str, name: &str, activation_link: &str) -> AppResult<()> {
        let body = format!(
            "Hello {},\n\n\
             You have been invited to join the CMS. Set your password and \
             activate your account using the link below:\n\n\
             {}\n\n\
             This link expires in 7 days.\n",
            name, activation_link
        );

        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: "You're invited - activate your account".to_string(),
            body,
        })
        .await
    }

    async fn send_password_reset(&self, to: &str, name: &str, reset_link: &str) -> AppResult<()> {
        let body = format!(
            "Hello {},\n\n\
             A password reset was requested for your account. Choose a new \
             password using the link below:\n\n\
             {}\n\n\
             This link expires in 1 hour. If you did not request this, you \
             can ignore this email.\n",
            name, reset_link
        );

        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: "Password reset request".to_string(),
            body,
        })
        .await
    }
}
