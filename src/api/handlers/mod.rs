//! HTTP request handlers.

pub mod auth_handler;
pub mod invitation_handler;
pub mod recovery_handler;
pub mod user_handler;
