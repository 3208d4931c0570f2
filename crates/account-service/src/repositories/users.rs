//! Postgres-backed credential store.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::{NewUser, User, UserUpdate};
use crate::repositories::CredentialStore;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, display_name, password_hash, \
     avatar_url, cover_url, refresh_token, watch_history, created_at, updated_at";

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        PgCredentialStore { pool, bcrypt_cost }
    }
}

/// Classify a Postgres failure per the error taxonomy: unique violations are
/// `Conflict`, not-null/check violations are data-validation failures from
/// the store and therefore `BadRequest`, everything else is `Internal`.
fn classify(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => {
                return ApiError::conflict("User with the email or username already exists");
            }
            Some("23502") | Some("23514") => {
                return ApiError::bad_request(db.message().to_string());
            }
            _ => {}
        }
    }
    ApiError::from(e)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = LOWER($1) OR email = $1",
        ))
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let password_hash =
            crypto::hash_password(new_user.password.expose_secret(), self.bcrypt_cost)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, display_name, password_hash, avatar_url, cover_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}",
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.display_name)
        .bind(&password_hash)
        .bind(&new_user.avatar_url)
        .bind(&new_user.cover_url)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(user)
    }

    async fn update_fields(&self, id: Uuid, update: UserUpdate) -> Result<User, ApiError> {
        let set_refresh = update.refresh_token.is_some();
        let refresh_value = update.refresh_token.flatten();

        let password_hash = match &update.password {
            Some(password) => Some(crypto::hash_password(
                password.expose_secret(),
                self.bcrypt_cost,
            )?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
               refresh_token = CASE WHEN $2 THEN $3 ELSE refresh_token END, \
               password_hash = COALESCE($4, password_hash), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}",
        ))
        .bind(id)
        .bind(set_refresh)
        .bind(refresh_value)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        user.ok_or_else(|| ApiError::not_found("User not found"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(())
    }
}
