//! In-memory credential store with the Postgres implementation's semantics.

use account_service::crypto;
use account_service::errors::ApiError;
use account_service::models::{NewUser, User, UserUpdate};
use account_service::repositories::CredentialStore;
use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Bcrypt cost for test fixtures: the bottom of the accepted window, so
/// seeding users stays fast.
const TEST_BCRYPT_COST: u32 = 10;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<Uuid, User>>,
    fail_next_create: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create` fail with `Conflict`, simulating a concurrent
    /// registration winning the race between pre-check and insert.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Insert a ready-made account with a hashed password.
    pub async fn seed_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        self.create(NewUser {
            username: username.to_lowercase(),
            email: email.to_string(),
            display_name: username.to_string(),
            password: SecretString::from(password),
            avatar_url: "https://assets.test/avatar.png".to_string(),
            cover_url: String::new(),
        })
        .await
    }

    pub fn user_count(&self) -> usize {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, ApiError> {
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        let lowered = identity.to_lowercase();
        Ok(users
            .values()
            .find(|u| u.username == lowered || u.email == identity)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(ApiError::conflict(
                "User with the email or username already exists",
            ));
        }

        // Mirror the table's check constraints: blank identity columns are a
        // data-validation failure from the store.
        for (value, column) in [
            (new_user.username.as_str(), "username"),
            (new_user.email.as_str(), "email"),
            (new_user.display_name.as_str(), "display_name"),
            (new_user.avatar_url.as_str(), "avatar_url"),
        ] {
            if value.is_empty() {
                return Err(ApiError::bad_request(format!(
                    "{} must not be blank",
                    column
                )));
            }
        }

        let password_hash =
            crypto::hash_password(new_user.password.expose_secret(), TEST_BCRYPT_COST)?;

        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(ApiError::conflict(
                "User with the email or username already exists",
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            display_name: new_user.display_name,
            password_hash,
            avatar_url: new_user.avatar_url,
            cover_url: new_user.cover_url,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_fields(&self, id: Uuid, update: UserUpdate) -> Result<User, ApiError> {
        let password_hash = match &update.password {
            Some(password) => Some(crypto::hash_password(
                password.expose_secret(),
                TEST_BCRYPT_COST,
            )?),
            None => None,
        };

        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        let user = users
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if let Some(refresh_token) = update.refresh_token {
            user.refresh_token = refresh_token;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users.remove(&id);
        Ok(())
    }
}
