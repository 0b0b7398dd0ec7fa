//! Session authentication middleware.
//!
//! Accepts the session JWT from the HTTP-only cookie (browser clients)
//! or a Bearer Authorization header (API clients). After signature and
//! expiry checks, the account is re-read from the store so that deleted
//! or deactivated accounts lose access immediately, and role/permission
//! changes take effect on the next request rather than at token renewal.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::api::AppState;
use crate::config::{BEARER_TOKEN_PREFIX, SESSION_COOKIE_NAME};
use crate::domain::{Capability, UserRole};
use crate::errors::AppError;

/// Authenticated user attached to the request extensions.
///
/// Role and permissions reflect the store at request time, not the
/// values frozen into the JWT at login.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub permissions: HashSet<Capability>,
}

impl CurrentUser {
    /// Check if user has the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check capability: admins hold everything, assistant admins hold
    /// their granted set, plain roles hold nothing.
    pub fn has_capability(&self, capability: Capability) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::AssistantAdmin => self.permissions.contains(&capability),
            _ => false,
        }
    }
}

/// Pull the session token out of the cookie header, if present.
fn session_cookie_token(request: &Request) -> Option<String> {
    let header = request.headers().get(COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE_NAME).then(|| value.to_string())
    })
}

/// Fall back to the Authorization header for non-browser clients.
fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(|t| t.to_string())
}

/// Session authentication middleware.
///
/// Validates the JWT, re-resolves the account, and injects CurrentUser
/// into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_cookie_token(&request)
        .or_else(|| bearer_token(&request))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(&token)?;

    // Live lookup: a valid token for a deleted or pending account is useless
    let user = state
        .user_service
        .get_user(claims.sub)
        .await
        .map_err(identity_lookup_error)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let current_user = CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
        permissions: user.permissions,
    };

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Map the identity lookup result onto the session's fate. A missing
/// account means the session is dead; any other failure (a database
/// outage, say) stays a server error and must not read as a revoked
/// session to the client.
fn identity_lookup_error(err: AppError) -> AppError {
    match err {
        AppError::NotFound => AppError::Unauthorized,
        other => other,
    }
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Require a specific capability (admins always pass).
pub fn require_capability(user: &CurrentUser, capability: Capability) -> Result<(), AppError> {
    if user.has_capability(capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbErr, RuntimeErr};

    #[test]
    fn missing_account_invalidates_the_session() {
        let err = identity_lookup_error(AppError::NotFound);
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn storage_failure_stays_a_server_error() {
        let outage = AppError::Database(DbErr::Conn(RuntimeErr::Internal(
            "connection refused".to_string(),
        )));
        let err = identity_lookup_error(outage);
        assert!(matches!(err, AppError::Database(_)));
    }
}
