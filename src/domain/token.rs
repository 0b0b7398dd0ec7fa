//! One-time opaque tokens for activation and password recovery.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;

use crate::config::{ACTIVATION_TOKEN_TTL_DAYS, ONE_TIME_TOKEN_LENGTH, RESET_TOKEN_TTL_HOURS};

/// A freshly minted single-use token with its expiry timestamp.
///
/// The raw value is mailed to the account holder; only the holder ever
/// presents it back. Consumption is a conditional update in the store,
/// so a token can never be redeemed twice.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// Activation token: 7-day validity.
    pub fn activation() -> Self {
        Self::generate(Duration::days(ACTIVATION_TOKEN_TTL_DAYS))
    }

    /// Password reset token: 1-hour validity.
    pub fn password_reset() -> Self {
        Self::generate(Duration::hours(RESET_TOKEN_TTL_HOURS))
    }

    fn generate(ttl: Duration) -> Self {
        Self {
            value: Alphanumeric.sample_string(&mut OsRng, ONE_TIME_TOKEN_LENGTH),
            expires_at: Utc::now() + ttl,
        }
    }
}
