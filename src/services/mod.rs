//! Service layer - Business logic and use cases.

mod auth_service;
mod container;
mod invitation_service;
mod recovery_service;
mod user_service;

pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use container::{ServiceContainer, Services};
pub use invitation_service::{InvitationManager, InvitationOutcome, InvitationService};
pub use recovery_service::{PasswordRecoveryManager, PasswordRecoveryService};
pub use user_service::{UserManager, UserService};
