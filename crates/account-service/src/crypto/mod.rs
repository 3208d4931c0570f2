//! Password hashing and verification.

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::ApiError;

/// A real bcrypt hash of no known password. Verifying a candidate against it
/// burns the same work as a genuine check, keeping the unknown-user and
/// wrong-password paths indistinguishable by timing.
const DUMMY_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Hash a password with bcrypt (per-record salt, configurable cost).
///
/// The cost is validated here even though configuration already clamps it,
/// so a caller cannot hash below the accepted window.
pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(ApiError::internal(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {}", e)))
}

/// Constant-time verification of a candidate password against a stored hash.
pub fn verify_password(candidate: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(candidate, hash)
        .map_err(|e| ApiError::internal(format!("Password verification failed: {}", e)))
}

/// Verify against the dummy hash and discard the result.
///
/// Called on the no-such-user path so lookups that miss cost the same as
/// lookups that hit with a wrong password.
pub fn burn_password_check(candidate: &str) {
    let _ = bcrypt::verify(candidate, DUMMY_HASH);
}
