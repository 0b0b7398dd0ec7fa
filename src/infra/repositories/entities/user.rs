//! SeaORM entity for the `users` table.

use sea_orm::entity::prelude::*;

use crate::domain::{self, UserRole};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    /// NULL is the "no usable password yet" sentinel for pending accounts
    pub password_hash: Option<String>,
    pub role: String,
    /// JSON array of capability tags; `[]` for every non-AssistantAdmin role
    pub permissions: Json,
    pub is_active: bool,
    pub activation_token: Option<String>,
    pub activation_expires_at: Option<DateTimeUtc>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for domain::User {
    fn from(model: Model) -> Self {
        let permissions = serde_json::from_value(model.permissions).unwrap_or_else(|e| {
            // Only reachable if the column was written outside this crate
            tracing::warn!(user_id = %model.id, error = %e, "Dropping unparsable permissions");
            Default::default()
        });

        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            password_hash: model.password_hash,
            role: UserRole::from(model.role.as_str()),
            permissions,
            is_active: model.is_active,
            activation_token: model.activation_token,
            activation_expires_at: model.activation_expires_at,
            password_reset_token: model.password_reset_token,
            password_reset_expires_at: model.password_reset_expires_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
