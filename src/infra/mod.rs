//! Infrastructure layer - External system integrations
//!
//! Database access, Redis cache, outbound email, and the repository layer.

pub mod cache;
pub mod db;
pub mod mailer;
pub mod repositories;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use mailer::{Mailer, SmtpMailer};
pub use repositories::{UserRepository, UserStore};
