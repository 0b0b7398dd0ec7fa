//! User repository - the credential store.
//!
//! All account state lives in the `users` table and every mutation goes
//! through this repository. One-time token consumption is a single
//! conditional UPDATE so that check-and-consume cannot race: the losing
//! duplicate request simply matches zero rows.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{Capability, OneTimeToken, User, UserRole};
use crate::errors::{AppError, AppResult};

/// Credential store contract, mockable for service tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Lookup by email. This is also the login path: the returned entity
    /// carries the password hash, which never serializes outward.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_activation_token(&self, token: &str) -> AppResult<Option<User>>;

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    /// Create an already-active account (self-registration).
    async fn create(
        &self,
        email: String,
        name: String,
        password_hash: String,
        role: UserRole,
    ) -> AppResult<User>;

    /// Create a pending account with the password sentinel and an
    /// activation token (administrative invitation).
    async fn create_pending(
        &self,
        email: String,
        name: String,
        role: UserRole,
        permissions: HashSet<Capability>,
        token: OneTimeToken,
    ) -> AppResult<User>;

    /// Replace the activation token, invalidating the previous one immediately.
    async fn set_activation_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User>;

    /// Atomically promote a pending account: set the password, flip
    /// is_active, and clear the token, but only if the token still matches,
    /// is unexpired, and the account is still pending. Returns whether a
    /// row changed.
    async fn consume_activation_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: String,
    ) -> AppResult<bool>;

    async fn set_reset_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User>;

    /// Atomically set a new password and clear the reset token, but only if
    /// the token still matches and is unexpired. Returns whether a row changed.
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

    /// Change the role. Leaving AssistantAdmin clears the permission set in
    /// the same statement, so the role-permission invariant cannot be broken
    /// by a forgetful caller.
    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Replace the permission set. Only valid for AssistantAdmin accounts.
    async fn update_permissions(
        &self,
        id: Uuid,
        permissions: HashSet<Capability>,
    ) -> AppResult<User>;

    /// Hard delete. No tombstones.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM-backed credential store.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn permissions_json(permissions: &HashSet<Capability>) -> AppResult<serde_json::Value> {
        serde_json::to_value(permissions)
            .map_err(|e| AppError::internal(format!("Permission serialization failed: {}", e)))
    }

    async fn fetch(&self, id: Uuid) -> AppResult<User> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }
}

/// Violating the unique email index is a caller conflict, not a server
/// fault. Services check first, but a concurrent writer can still slip
/// between the check and the write; the index is the real arbiter.
fn conflict_on_unique(err: DbErr, entity: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(entity),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_activation_token(&self, token: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::ActivationToken.eq(token))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::PasswordResetToken.eq(token))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(
        &self,
        email: String,
        name: String,
        password_hash: String,
        role: UserRole,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name),
            password_hash: Set(Some(password_hash)),
            role: Set(role.as_str().to_string()),
            permissions: Set(serde_json::json!([])),
            is_active: Set(true),
            activation_token: Set(None),
            activation_expires_at: Set(None),
            password_reset_token: Set(None),
            password_reset_expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "User"))?;
        Ok(User::from(model))
    }

    async fn create_pending(
        &self,
        email: String,
        name: String,
        role: UserRole,
        permissions: HashSet<Capability>,
        token: OneTimeToken,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name),
            password_hash: Set(None),
            role: Set(role.as_str().to_string()),
            permissions: Set(Self::permissions_json(&permissions)?),
            is_active: Set(false),
            activation_token: Set(Some(token.value)),
            activation_expires_at: Set(Some(token.expires_at)),
            password_reset_token: Set(None),
            password_reset_expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "User"))?;
        Ok(User::from(model))
    }

    async fn set_activation_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.activation_token = Set(Some(token.value));
        active.activation_expires_at = Set(Some(token.expires_at));
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn consume_activation_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: String,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(Some(password_hash)))
            .col_expr(user::Column::IsActive, Expr::value(true))
            .col_expr(
                user::Column::ActivationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::ActivationExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::IsActive.eq(false))
            .filter(user::Column::ActivationToken.eq(token))
            .filter(user::Column::ActivationExpiresAt.gt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn set_reset_token(&self, id: Uuid, token: OneTimeToken) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.password_reset_token = Set(Some(token.value));
        active.password_reset_expires_at = Set(Some(token.expires_at));
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: String,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(Some(password_hash)))
            .col_expr(
                user::Column::PasswordResetToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::PasswordResetExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::PasswordResetToken.eq(token))
            .filter(user::Column::PasswordResetExpiresAt.gt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "Email"))?;
        Ok(User::from(model))
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let now = Utc::now();
        let mut stmt = UserEntity::update_many()
            .col_expr(user::Column::Role, Expr::value(role.as_str()))
            .col_expr(user::Column::UpdatedAt, Expr::value(now));

        // Permissions only have meaning for AssistantAdmin; clearing them in
        // the same statement keeps the invariant unbreakable.
        if role != UserRole::AssistantAdmin {
            stmt = stmt.col_expr(user::Column::Permissions, Expr::value(serde_json::json!([])));
        }

        let result = stmt.filter(user::Column::Id.eq(id)).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        self.fetch(id).await
    }

    async fn update_permissions(
        &self,
        id: Uuid,
        permissions: HashSet<Capability>,
    ) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if UserRole::from(model.role.as_str()) != UserRole::AssistantAdmin {
            return Err(AppError::validation(
                "Permissions can only be assigned to the assistant_admin role",
            ));
        }

        let mut active: ActiveModel = model.into();
        active.permissions = Set(Self::permissions_json(&permissions)?);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
