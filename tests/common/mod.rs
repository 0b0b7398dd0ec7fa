//! Shared test fixtures and mocks.

#![allow(dead_code)]

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use uuid::Uuid;

use cms_backend::config::Config;
use cms_backend::domain::{Capability, OneTimeToken, User, UserRole};
use cms_backend::errors::AppResult;
use cms_backend::infra::{Mailer, UserRepository};

mock! {
    pub UserRepo {}

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
        async fn find_by_activation_token(&self, token: &str) -> AppResult<Option<User>>;
        async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;
        async fn list(&self) -> AppResult<Vec<User>>;
        async fn create(
            &self,
            email: String,
            name: String,
            password_hash: String,
            role: UserRole,
        ) -> AppResult<User>;
        async fn create_pending(
            &self,
            email: String,
            name: String,
            role: UserRole,
            permissions: HashSet<Capability>,
            token: OneTimeToken,
        ) -> AppResult<User>;
        async fn set_activation_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User>;
        async fn consume_activation_token(
            &self,
            id: Uuid,
            token: &str,
            password_hash: String,
        ) -> AppResult<bool>;
        async fn set_reset_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User>;
        async fn consume_reset_token(
            &self,
            id: Uuid,
            token: &str,
            password_hash: String,
        ) -> AppResult<bool>;
        async fn update_profile(
            &self,
            id: Uuid,
            name: Option<String>,
            email: Option<String>,
        ) -> AppResult<User>;
        async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;
        async fn update_permissions(
            &self,
            id: Uuid,
            permissions: HashSet<Capability>,
        ) -> AppResult<User>;
        async fn delete(&self, id: Uuid) -> AppResult<()>;
    }
}

mock! {
    pub MailerImpl {}

    #[async_trait]
    impl Mailer for MailerImpl {
        async fn send_invitation(
            &self,
            to: &str,
            name: &str,
            activation_link: &str,
        ) -> AppResult<()>;
        async fn send_password_reset(
            &self,
            to: &str,
            name: &str,
            reset_link: &str,
        ) -> AppResult<()>;
    }
}

/// Config with a valid-length signing secret, bypassing the environment.
pub fn test_config() -> Config {
    Config::for_tests("a-test-secret-that-is-long-enough-to-sign-with")
}

/// An active editor account with a placeholder password hash.
pub fn active_user(id: Uuid) -> User {
    User {
        id,
        email: "editor@example.com".to_string(),
        name: "Test Editor".to_string(),
        password_hash: Some("$argon2id$placeholder".to_string()),
        role: UserRole::Editor,
        permissions: HashSet::new(),
        is_active: true,
        activation_token: None,
        activation_expires_at: None,
        password_reset_token: None,
        password_reset_expires_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A pending (invited, not yet activated) account holding `token`.
pub fn pending_user(id: Uuid, token: &str) -> User {
    User {
        id,
        email: "invitee@example.com".to_string(),
        name: "Invited User".to_string(),
        password_hash: None,
        role: UserRole::ContentManager,
        permissions: HashSet::new(),
        is_active: false,
        activation_token: Some(token.to_string()),
        activation_expires_at: Some(Utc::now() + Duration::days(7)),
        password_reset_token: None,
        password_reset_expires_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
