//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, invitation_handler, recovery_handler, user_handler};
use crate::domain::{UserResponse, UserRole};
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// OpenAPI documentation for the CMS backend
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CMS Backend",
        version = "0.1.0",
        description = "Account lifecycle, sessions, and authorization for the CMS",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::logout,
        recovery_handler::forgot_password,
        recovery_handler::reset_password,
        invitation_handler::validate_token,
        invitation_handler::activate,
        // User endpoints
        user_handler::me,
        user_handler::list_users,
        user_handler::update_user,
        user_handler::update_role,
        user_handler::update_permissions,
        user_handler::delete_user,
        invitation_handler::invite,
        invitation_handler::resend_invitation,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::LoginResponse,
            TokenResponse,
            recovery_handler::ForgotPasswordRequest,
            recovery_handler::ResetPasswordRequest,
            invitation_handler::InviteRequest,
            invitation_handler::InviteResponse,
            invitation_handler::ResendInvitationRequest,
            invitation_handler::ActivateRequest,
            // User handler types
            user_handler::UpdateUserRequest,
            user_handler::UpdateRoleRequest,
            user_handler::UpdatePermissionsRequest,
            MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login, activation, and password recovery"),
        (name = "Users", description = "User administration operations")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for the session JWT.
///
/// Browser clients carry the token in the HTTP-only cookie; the Bearer
/// scheme documented here is the equivalent for API clients.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session JWT obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
