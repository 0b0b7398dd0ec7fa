//! Invitation service - admin-driven account provisioning.
//!
//! Invited accounts are created as pending records without credentials.
//! The invitee proves ownership of the email address by following the
//! activation link and choosing a password, which atomically consumes
//! the activation token.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{Capability, OneTimeToken, Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::{Mailer, UserRepository};

/// Result of an invitation: the created pending account plus whether the
/// invitation email actually went out.
#[derive(Debug)]
pub struct InvitationOutcome {
    pub user: User,
    pub email_sent: bool,
}

/// Invitation service trait for dependency injection.
#[async_trait]
pub trait InvitationService: Send + Sync {
    /// Create a pending account and email an activation link.
    ///
    /// Mail delivery failure does not fail the invitation; the outcome
    /// reports it so the caller can resend later.
    async fn invite(
        &self,
        email: String,
        name: String,
        role: UserRole,
        permissions: Vec<String>,
    ) -> AppResult<InvitationOutcome>;

    /// Rotate the activation token for a pending account and resend the email
    async fn resend_invitation(&self, email: String) -> AppResult<User>;

    /// Check an activation token without consuming it
    async fn validate_token(&self, token: &str) -> AppResult<User>;

    /// Consume an activation token, setting the password and activating the account
    async fn activate(&self, token: &str, password: String) -> AppResult<User>;
}

/// Concrete implementation of InvitationService.
pub struct InvitationManager {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl InvitationManager {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    fn activation_link(&self, token: &str) -> String {
        format!("{}/activate/{}", self.config.app_url, token)
    }
}

#[async_trait]
impl InvitationService for InvitationManager {
    async fn invite(
        &self,
        email: String,
        name: String,
        role: UserRole,
        permissions: Vec<String>,
    ) -> AppResult<InvitationOutcome> {
        if role != UserRole::AssistantAdmin && !permissions.is_empty() {
            return Err(AppError::validation(
                "Permissions can only be assigned to assistant admins",
            ));
        }
        let capabilities = Capability::parse_set(&permissions)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let token = OneTimeToken::activation();
        let link = self.activation_link(&token.value);

        let user = self
            .users
            .create_pending(email.clone(), name.clone(), role, capabilities, token)
            .await?;

        // The account exists either way; a failed email is recoverable
        // through the resend endpoint.
        let email_sent = match self.mailer.send_invitation(&email, &name, &link).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Invitation email failed to send");
                false
            }
        };

        Ok(InvitationOutcome { user, email_sent })
    }

    async fn resend_invitation(&self, email: String) -> AppResult<User> {
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::NotFound)?;

        if user.is_active {
            return Err(AppError::conflict("An active account"));
        }

        // Rotate the token so previously mailed links stop working
        let token = OneTimeToken::activation();
        let link = self.activation_link(&token.value);
        let user = self.users.set_activation_token(user.id, token).await?;

        self.mailer
            .send_invitation(&user.email, &user.name, &link)
            .await?;

        Ok(user)
    }

    async fn validate_token(&self, token: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_activation_token(token)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        if !user.activation_token_is_valid(token, Utc::now()) {
            return Err(AppError::InvalidOrExpiredToken);
        }

        Ok(user)
    }

    async fn activate(&self, token: &str, password: String) -> AppResult<User> {
        let user = self.validate_token(token).await?;
        let password_hash = Password::new(&password)?.into_string();

        // Conditional update: only succeeds if the token is still attached,
        // unexpired, and the account is still pending. A concurrent
        // activation loses the race and gets a token error.
        let consumed = self
            .users
            .consume_activation_token(user.id, token, password_hash)
            .await?;

        if !consumed {
            return Err(AppError::InvalidOrExpiredToken);
        }

        self.users
            .find_by_id(user.id)
            .await?
            .ok_or(AppError::NotFound)
    }
}
