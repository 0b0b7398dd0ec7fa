//! User domain entity, roles, and capability tags.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// User roles enumeration.
///
/// `Admin` and `AssistantAdmin` are elevated; `Editor` is the default
/// (lowest-privilege) role for self-registered accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Editor,
    ContentManager,
    AssistantAdmin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Stored/wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::ContentManager => "content_manager",
            UserRole::AssistantAdmin => "assistant_admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            "content_manager" => Ok(UserRole::ContentManager),
            "assistant_admin" => Ok(UserRole::AssistantAdmin),
            other => Err(AppError::validation(format!("Unknown role: {}", other))),
        }
    }
}

// Lenient conversion for values read back from storage, where the role
// column only ever holds strings written through UserRole.
impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or(UserRole::Editor)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability tags grantable to the AssistantAdmin role.
///
/// A fixed vocabulary: unknown tags are a validation error, never
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageContent,
    ManageJobs,
    ManagePartners,
    ManageTestimonials,
    ManageUsers,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageContent => "manage_content",
            Capability::ManageJobs => "manage_jobs",
            Capability::ManagePartners => "manage_partners",
            Capability::ManageTestimonials => "manage_testimonials",
            Capability::ManageUsers => "manage_users",
        }
    }

    /// Parse a list of raw capability tags, rejecting unknown entries.
    pub fn parse_set(tags: &[String]) -> Result<HashSet<Capability>, AppError> {
        tags.iter().map(|t| t.as_str().parse()).collect()
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manage_content" => Ok(Capability::ManageContent),
            "manage_jobs" => Ok(Capability::ManageJobs),
            "manage_partners" => Ok(Capability::ManagePartners),
            "manage_testimonials" => Ok(Capability::ManageTestimonials),
            "manage_users" => Ok(Capability::ManageUsers),
            other => Err(AppError::validation(format!(
                "Unknown permission tag: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// None is the sentinel for invited accounts that have not set a password
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    /// Non-empty only when role = AssistantAdmin
    pub permissions: HashSet<Capability>,
    /// False while the account is pending activation
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub activation_token: Option<String>,
    #[serde(skip_serializing)]
    pub activation_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// An invited account that has not been activated yet
    pub fn is_pending(&self) -> bool {
        !self.is_active
    }

    /// Capability check: admins hold every capability implicitly,
    /// assistant admins hold their granted subset, other roles hold none.
    pub fn has_capability(&self, capability: Capability) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::AssistantAdmin => self.permissions.contains(&capability),
            _ => false,
        }
    }

    /// Whether the stored activation token matches and is still live
    pub fn activation_token_is_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.is_pending()
            && self.activation_token.as_deref() == Some(token)
            && self.activation_expires_at.is_some_and(|exp| exp > now)
    }

    /// Whether the stored reset token matches and is still live
    pub fn reset_token_is_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.password_reset_token.as_deref() == Some(token)
            && self.password_reset_expires_at.is_some_and(|exp| exp > now)
    }
}

/// User update data transfer object
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUser {
    /// New display name
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    /// New email address
    #[schema(example = "jane@example.org")]
    pub email: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "user@example.org")]
    pub email: String,
    /// User display name
    #[schema(example = "John Doe")]
    pub name: String,
    /// User role
    #[schema(example = "editor")]
    pub role: String,
    /// Granted capability tags (AssistantAdmin only)
    #[schema(example = json!(["manage_content"]))]
    pub permissions: Vec<String>,
    /// Whether the account has been activated
    pub is_active: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let mut permissions: Vec<String> = user
            .permissions
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        permissions.sort();

        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.to_string(),
            permissions,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_user(token: &str, expires_at: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "bob@example.org".to_string(),
            name: "Bob".to_string(),
            password_hash: None,
            role: UserRole::ContentManager,
            permissions: HashSet::new(),
            is_active: false,
            activation_token: Some(token.to_string()),
            activation_expires_at: Some(expires_at),
            password_reset_token: None,
            password_reset_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_round_trip() {
        for role in [
            UserRole::Admin,
            UserRole::Editor,
            UserRole::ContentManager,
            UserRole::AssistantAdmin,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn capability_parse_rejects_unknown_tags() {
        let tags = vec!["manage_content".to_string(), "manage_everything".to_string()];
        assert!(Capability::parse_set(&tags).is_err());

        let tags = vec!["manage_content".to_string(), "manage_jobs".to_string()];
        let set = Capability::parse_set(&tags).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn admin_holds_all_capabilities() {
        let mut user = pending_user("t", Utc::now());
        user.role = UserRole::Admin;
        assert!(user.has_capability(Capability::ManageUsers));
        assert!(user.has_capability(Capability::ManageJobs));
    }

    #[test]
    fn assistant_admin_holds_only_granted_capabilities() {
        let mut user = pending_user("t", Utc::now());
        user.role = UserRole::AssistantAdmin;
        user.permissions.insert(Capability::ManageContent);
        assert!(user.has_capability(Capability::ManageContent));
        assert!(!user.has_capability(Capability::ManageUsers));
    }

    #[test]
    fn plain_roles_hold_no_capabilities() {
        let mut user = pending_user("t", Utc::now());
        user.role = UserRole::Editor;
        user.permissions.insert(Capability::ManageContent);
        assert!(!user.has_capability(Capability::ManageContent));
    }

    #[test]
    fn activation_token_expiry_is_checked() {
        let now = Utc::now();
        let user = pending_user("tok", now + Duration::days(1));
        assert!(user.activation_token_is_valid("tok", now));
        assert!(!user.activation_token_is_valid("other", now));

        let expired = pending_user("tok", now - Duration::hours(1));
        assert!(!expired.activation_token_is_valid("tok", now));
    }

    #[test]
    fn active_user_fails_activation_token_check() {
        let now = Utc::now();
        let mut user = pending_user("tok", now + Duration::days(1));
        user.is_active = true;
        assert!(!user.activation_token_is_valid("tok", now));
    }

    #[test]
    fn response_never_carries_secrets() {
        let mut user = pending_user("tok", Utc::now());
        user.password_hash = Some("$argon2id$...".to_string());
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        let body = json.to_string();
        assert!(!body.contains("argon2"));
        assert!(!body.contains("password"));
        assert!(!body.contains("tok\""));
    }
}
