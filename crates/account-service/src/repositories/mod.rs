//! Credential store interface and implementations.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use uuid::Uuid;

pub mod users;

pub use users::PgCredentialStore;

/// Persistence contract for user records.
///
/// All mutations are single-record and atomic at the store level; there are
/// no multi-record transactions because each record is self-contained.
/// Uniqueness of username/email is the store's responsibility: `create` must
/// fail with `Conflict` on a duplicate even if the caller pre-checked.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by lowercase username or email.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    /// Create a user, hashing the password before persistence.
    /// Fails with `Conflict` if the username or email is already taken.
    async fn create(&self, new_user: NewUser) -> Result<User, ApiError>;

    /// Apply a partial update (refresh token set/clear, password re-hash).
    /// Fails with `NotFound` if the user does not exist.
    async fn update_fields(&self, id: Uuid, update: UserUpdate) -> Result<User, ApiError>;

    /// Remove a user record. Deleting an absent user is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;

    /// Constant-time check of a candidate password against the stored hash.
    fn verify_password(&self, user: &User, candidate: &str) -> Result<bool, ApiError> {
        crypto::verify_password(candidate, &user.password_hash)
    }
}
