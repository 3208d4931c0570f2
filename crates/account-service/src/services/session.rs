//! Session orchestration: login, logout, refresh rotation, password change.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::{SanitizedUser, TokenPair, UserUpdate};
use crate::repositories::CredentialStore;
use crate::services::token_service::{TokenKind, TokenService};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use uuid::Uuid;

/// Login credentials as delivered by the transport layer.
#[derive(Debug, Default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// A user plus a freshly issued token pair (login and refresh both return
/// this shape).
#[derive(Debug)]
pub struct SessionOutput {
    pub user: SanitizedUser,
    pub tokens: TokenPair,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Verify credentials and open a session.
///
/// Unknown user and wrong password are indistinguishable to the caller: both
/// return the same `Unauthorized` message, and the unknown-user path burns a
/// dummy hash check so the two cost the same.
#[instrument(skip_all)]
pub async fn login(
    store: &dyn CredentialStore,
    tokens: &TokenService,
    input: LoginInput,
) -> Result<SessionOutput, ApiError> {
    let identity = non_blank(input.email.as_deref())
        .or_else(|| non_blank(input.username.as_deref()))
        .map(str::to_string);

    let password = input
        .password
        .filter(|p| !p.expose_secret().trim().is_empty());

    let (Some(identity), Some(password)) = (identity, password) else {
        return Err(ApiError::bad_request(
            "Email or username and password are required",
        ));
    };

    let user = match store.find_by_identity(&identity).await? {
        Some(user) => user,
        None => {
            crypto::burn_password_check(password.expose_secret());
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !store.verify_password(&user, password.expose_secret())? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let pair = tokens.issue_pair(user.id)?;

    // Only the token field changes; this write bypasses full validation.
    let updated = store
        .update_fields(user.id, UserUpdate::set_refresh_token(&pair.refresh_token))
        .await?;

    Ok(SessionOutput {
        user: updated.sanitized(),
        tokens: pair,
    })
}

/// Close the current session. Idempotent: logging out twice, or after the
/// account vanished, is still success.
#[instrument(skip_all)]
pub async fn logout(store: &dyn CredentialStore, user_id: Uuid) -> Result<(), ApiError> {
    match store
        .update_fields(user_id, UserUpdate::clear_refresh_token())
        .await
    {
        Ok(_) => Ok(()),
        Err(ApiError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Rotate the session on a valid refresh token.
///
/// A cryptographically valid token is not enough: it must also equal the
/// value currently mirrored on the user record, which makes every refresh
/// token single-use (rotation permanently invalidates the previous one).
///
/// The equality check and the overwrite are not a critical section; two
/// concurrent refreshes with the same token can both pass the check. This is
/// an accepted race, kept as the source system intends.
#[instrument(skip_all)]
pub async fn refresh(
    store: &dyn CredentialStore,
    tokens: &TokenService,
    incoming: Option<String>,
) -> Result<SessionOutput, ApiError> {
    let token = incoming
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token is missing"))?;

    let verified = tokens.verify(&token, TokenKind::Refresh)?;

    let user = store
        .find_by_id(verified.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(token.as_str()) {
        return Err(ApiError::unauthorized("Invalid refresh token"));
    }

    let pair = tokens.issue_pair(user.id)?;
    let updated = store
        .update_fields(user.id, UserUpdate::set_refresh_token(&pair.refresh_token))
        .await?;

    Ok(SessionOutput {
        user: updated.sanitized(),
        tokens: pair,
    })
}

/// Change the caller's password.
///
/// Existing access tokens stay valid until natural expiry; only the stored
/// hash changes. That is a documented limitation, not an oversight.
#[instrument(skip_all)]
pub async fn change_password(
    store: &dyn CredentialStore,
    user_id: Uuid,
    old_password: Option<SecretString>,
    new_password: Option<SecretString>,
) -> Result<(), ApiError> {
    let old = old_password.filter(|p| !p.expose_secret().trim().is_empty());
    let new = new_password.filter(|p| !p.expose_secret().trim().is_empty());

    let (Some(old), Some(new)) = (old, new) else {
        return Err(ApiError::bad_request(
            "Old and new password are required",
        ));
    };

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !store.verify_password(&user, old.expose_secret())? {
        return Err(ApiError::bad_request("Old password is incorrect"));
    }

    // Re-hashed by the store layer before persistence.
    store
        .update_fields(user_id, UserUpdate::set_password(new))
        .await?;

    Ok(())
}
