//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.

pub mod password;
pub mod token;
pub mod user;

pub use password::Password;
pub use token::OneTimeToken;
pub use user::{Capability, UpdateUser, User, UserResponse, UserRole};
