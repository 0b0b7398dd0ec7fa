//! User administration handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{Capability, UpdateUser, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::types::NoContent;

/// Profile update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
}

/// Role change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// New role for the account
    pub role: UserRole,
}

/// Permission replacement request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    /// Capability tags; the target must be an assistant admin
    #[schema(example = json!(["manage_content", "manage_jobs"]))]
    pub permissions: Vec<String>,
}

/// Get the authenticated user's own profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("session" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(current_user.id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// List all users (admin, or assistant admin with manage_users)
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Insufficient permissions")
    ),
    security(("session" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<UserResponse>>> {
    if !current_user.has_capability(Capability::ManageUsers) {
        return Err(AppError::Forbidden);
    }

    let users = state.user_service.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Update a user's profile (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("session" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state
        .user_service
        .update_user(
            id,
            UpdateUser {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Change a user's role (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("session" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state.user_service.update_role(id, payload.role).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Replace an assistant admin's permissions (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permissions updated", body = UserResponse),
        (status = 400, description = "Unknown capability or target is not an assistant admin"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("session" = []))
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionsRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;

    let user = state
        .user_service
        .update_permissions(id, payload.permissions)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Permanently delete a user (admin only, cannot delete yourself)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("session" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;

    state.user_service.delete_user(id, current_user.id).await?;

    Ok(NoContent)
}
