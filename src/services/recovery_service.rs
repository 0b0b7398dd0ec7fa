//! Password recovery service - forgot-password and reset flows.
//!
//! Reset tokens are short-lived (1 hour) and single-use. Pending accounts
//! are excluded from recovery entirely: they have no password to reset and
//! must go through activation instead.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{OneTimeToken, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{Mailer, UserRepository};

/// Password recovery service trait for dependency injection.
#[async_trait]
pub trait PasswordRecoveryService: Send + Sync {
    /// Issue a reset token and email the reset link
    async fn forgot_password(&self, email: String) -> AppResult<()>;

    /// Consume a reset token and set the new password
    async fn reset_password(&self, token: &str, password: String) -> AppResult<User>;
}

/// Concrete implementation of PasswordRecoveryService.
pub struct PasswordRecoveryManager {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl PasswordRecoveryManager {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.config.app_url, token)
    }
}

#[async_trait]
impl PasswordRecoveryService for PasswordRecoveryManager {
    async fn forgot_password(&self, email: String) -> AppResult<()> {
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::NotFound)?;

        // Pending accounts have no password; recovery does not apply
        if !user.is_active {
            return Err(AppError::NotFound);
        }

        let token = OneTimeToken::password_reset();
        let link = self.reset_link(&token.value);
        let user = self.users.set_reset_token(user.id, token).await?;

        self.mailer
            .send_password_reset(&user.email, &user.name, &link)
            .await?;

        Ok(())
    }

    async fn reset_password(&self, token: &str, password: String) -> AppResult<User> {
        let user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        if !user.reset_token_is_valid(token, Utc::now()) {
            return Err(AppError::InvalidOrExpiredToken);
        }

        let password_hash = Password::new(&password)?.into_string();

        // Single-use: the conditional update clears the token in the same
        // statement that writes the new hash.
        let consumed = self
            .users
            .consume_reset_token(user.id, token, password_hash)
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
