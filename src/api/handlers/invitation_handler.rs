//! Invitation handlers: invite, resend, token validation, activation.
//!
//! Invite and resend are admin operations on the /users surface; token
//! validation and activation are public (the invitee has no session yet).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{UserResponse, UserRole};
use crate::errors::AppResult;
use crate::types::MessageResponse;

/// Invitation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteRequest {
    /// Invitee email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new.editor@example.com")]
    pub email: String,
    /// Invitee display name
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "New Editor")]
    pub name: String,
    /// Role for the new account
    pub role: UserRole,
    /// Capability tags, only valid for assistant admins
    #[serde(default)]
    #[schema(example = json!(["manage_content"]))]
    pub permissions: Vec<String>,
}

/// Invitation response: the pending account plus delivery status
#[derive(Debug, Serialize, ToSchema)]
pub struct InviteResponse {
    pub user: UserResponse,
    /// False when the invitation email could not be sent; use the
    /// resend endpoint to retry
    pub email_sent: bool,
}

/// Resend-invitation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendInvitationRequest {
    /// Email of the pending account
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new.editor@example.com")]
    pub email: String,
}

/// Activation request (token travels in the path)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ActivateRequest {
    /// Chosen password (minimum 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "SecurePass123!", min_length = 6)]
    pub password: String,
}

/// Invite a new user (admin only)
#[utoipa::path(
    post,
    path = "/users/invite",
    tag = "Users",
    request_body = InviteRequest,
    responses(
        (status = 201, description = "Invitation created", body = InviteResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "User already exists")
    ),
    security(("session" = []))
)]
pub async fn invite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<InviteRequest>,
) -> AppResult<(StatusCode, Json<InviteResponse>)> {
    require_admin(&current_user)?;

    let outcome = state
        .invitation_service
        .invite(payload.email, payload.name, payload.role, payload.permissions)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            user: UserResponse::from(outcome.user),
            email_sent: outcome.email_sent,
        }),
    ))
}

/// Resend an invitation with a fresh activation token (admin only)
#[utoipa::path(
    post,
    path = "/users/resend-invitation",
    tag = "Users",
    request_body = ResendInvitationRequest,
    responses(
        (status = 200, description = "Invitation resent", body = MessageResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Account is already active"),
        (status = 500, description = "Email delivery failed")
    ),
    security(("session" = []))
)]
pub async fn resend_invitation(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ResendInvitationRequest>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&current_user)?;

    state
        .invitation_service
        .resend_invitation(payload.email)
        .await?;

    Ok(Json(MessageResponse::new("Invitation resent")))
}

/// Check an activation token without consuming it
#[utoipa::path(
    get,
    path = "/auth/validate-token/{token}",
    tag = "Authentication",
    params(("token" = String, Path, description = "Activation token")),
    responses(
        (status = 200, description = "Token is valid", body = UserResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn validate_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.invitation_service.validate_token(&token).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Activate a pending account by setting its password
#[utoipa::path(
    post,
    path = "/auth/activate/{token}",
    tag = "Authentication",
    params(("token" = String, Path, description = "Activation token")),
    request_body = ActivateRequest,
    responses(
        (status = 200, description = "Account activated", body = UserResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ActivateRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .invitation_service
        .activate(&token, payload.password)
        .await?;

    Ok(Json(UserResponse::from(user)))
}
