//! Service Container - Centralized service access.
//!
//! Thread-safe access to all application services via Arc, with a single
//! shared repository instance behind them.

use std::sync::Arc;

use super::{AuthService, InvitationService, PasswordRecoveryService, UserService};
use crate::config::Config;
use crate::infra::{Mailer, UserStore};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get invitation service
    fn invitations(&self) -> Arc<dyn InvitationService>;

    /// Get password recovery service
    fn recovery(&self) -> Arc<dyn PasswordRecoveryService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    invitation_service: Arc<dyn InvitationService>,
    recovery_service: Arc<dyn PasswordRecoveryService>,
}

impl Services {
    /// Create service container from database connection, config and mailer
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        use super::{Authenticator, InvitationManager, PasswordRecoveryManager, UserManager};

        let users = Arc::new(UserStore::new(db));
        let auth_service = Arc::new(Authenticator::new(users.clone(), config.clone()));
        let user_service = Arc::new(UserManager::new(users.clone()));
        let invitation_service = Arc::new(InvitationManager::new(
            users.clone(),
            mailer.clone(),
            config.clone(),
        ));
        let recovery_service = Arc::new(PasswordRecoveryManager::new(users, mailer, config));

        Self {
            auth_service,
            user_service,
            invitation_service,
            recovery_service,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn invitations(&self) -> Arc<dyn InvitationService> {
        self.invitation_service.clone()
    }

    fn recovery(&self) -> Arc<dyn PasswordRecoveryService> {
        self.recovery_service.clone()
    }
}
