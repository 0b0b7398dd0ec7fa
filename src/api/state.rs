//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, Mailer};
use crate::services::{
    AuthService, InvitationService, PasswordRecoveryService, ServiceContainer, Services,
    UserService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Invitation service
    pub invitation_service: Arc<dyn InvitationService>,
    /// Password recovery service
    pub recovery_service: Arc<dyn PasswordRecoveryService>,
    /// Redis cache
    pub cache: Arc<Cache>,
    /// Database connection
    pub database: Arc<Database>,
    /// Application configuration
    pub config: Config,
}

impl AppState {
    /// Create application state from infrastructure and config.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let container = Arc::new(Services::from_connection(
            database.get_connection(),
            config.clone(),
            mailer,
        ));

        Self {
            auth_service: container.auth(),
            user_service: container.users(),
            invitation_service: container.invitations(),
            recovery_service: container.recovery(),
            cache,
            database,
            config,
        }
    }
}
