use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// User model (maps to the users table).
///
/// Deliberately not `Serialize`: the only view that crosses the wire is
/// [`SanitizedUser`], so the password hash and the mirrored refresh token
/// cannot leak into a response by construction.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_url: String,
    /// The single currently-valid refresh token, if a session is active.
    pub refresh_token: Option<String>,
    /// Ordered content ids; owned by the history subsystem, read-only here.
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password_hash", &"[REDACTED]")
            .field("avatar_url", &self.avatar_url)
            .field("cover_url", &self.cover_url)
            .field("refresh_token", &"[REDACTED]")
            .field("watch_history", &self.watch_history)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// The caller-facing view: no password hash, no refresh token.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_url: self.cover_url.clone(),
            watch_history: self.watch_history.clone(),
            created_at: self.created_at,
        }
    }
}

/// User view safe for responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_url: String,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a user. The store hashes the password before
/// persisting; plaintext never reaches a record.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: SecretString,
    pub avatar_url: String,
    pub cover_url: String,
}

/// Partial update applied by `CredentialStore::update_fields`.
///
/// Only the fields that session management mutates are expressible, so a
/// partial write cannot touch identity columns.
#[derive(Debug, Default)]
pub struct UserUpdate {
    /// `Some(Some(t))` sets the refresh token, `Some(None)` clears it.
    pub refresh_token: Option<Option<String>>,
    /// New password; re-hashed by the store layer before persistence.
    pub password: Option<SecretString>,
}

impl UserUpdate {
    pub fn set_refresh_token(token: impl Into<String>) -> Self {
        UserUpdate {
            refresh_token: Some(Some(token.into())),
            ..UserUpdate::default()
        }
    }

    pub fn clear_refresh_token() -> Self {
        UserUpdate {
            refresh_token: Some(None),
            ..UserUpdate::default()
        }
    }

    pub fn set_password(password: SecretString) -> Self {
        UserUpdate {
            password: Some(password),
            ..UserUpdate::default()
        }
    }
}

/// An access/refresh token pair as returned to the client.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}
