//! User service - account administration use cases.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Capability, UpdateUser, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Update user profile fields (name, email)
    async fn update_user(&self, id: Uuid, update: UpdateUser) -> AppResult<User>;

    /// Change a user's role. Moving off assistant admin clears permissions.
    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Replace an assistant admin's permission set
    async fn update_permissions(&self, id: Uuid, permissions: Vec<String>) -> AppResult<User>;

    /// Permanently delete a user account
    async fn delete_user(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
}

impl UserManager {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    async fn update_user(&self, id: Uuid, update: UpdateUser) -> AppResult<User> {
        if let Some(new_email) = &update.email {
            if let Some(existing) = self.users.find_by_email(new_email).await? {
                if existing.id != id {
                    return Err(AppError::conflict("Email"));
                }
            }
        }

        self.users
            .update_profile(id, update.name, update.email)
            .await
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        self.users.update_role(id, role).await
    }

    async fn update_permissions(&self, id: Uuid, permissions: Vec<String>) -> AppResult<User> {
        let capabilities = Capability::parse_set(&permissions)?;
        self.users.update_permissions(id, capabilities).await
    }

    async fn delete_user(&self, id: Uuid, acting_user_id: Uuid) -> AppResult<()> {
        if id == acting_user_id {
            return Err(AppError::validation("You cannot delete your own account"));
        }

        self.users.delete(id).await
    }
}
