//! Registration pipeline.
//!
//! Registration is a saga over external side effects: asset uploads happen
//! before the user record exists, so any failure past the first upload must
//! compensate by deleting whatever already landed remotely and whatever temp
//! files remain locally. Compensation is best-effort; the error the caller
//! sees is always the one that broke the pipeline, never a cleanup failure.

use crate::assets::{AssetStore, UploadedAsset};
use crate::errors::ApiError;
use crate::models::{NewUser, SanitizedUser};
use crate::repositories::CredentialStore;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

/// Parsed registration fields, as delivered by the transport layer
/// (uploaded files arrive as local temp paths).
#[derive(Debug)]
pub struct RegistrationInput {
    pub display_name: String,
    pub email: String,
    pub username: String,
    pub password: SecretString,
    pub avatar_path: Option<PathBuf>,
    pub cover_path: Option<PathBuf>,
}

/// Compensation stack for one registration attempt.
///
/// Remote uploads are unwound in reverse order; local temp paths are tracked
/// until an upload attempt consumes them (the asset client removes the file
/// whether or not the upload succeeded).
#[derive(Debug, Default)]
struct PendingAssets {
    uploaded: Vec<UploadedAsset>,
    temp_paths: Vec<PathBuf>,
}

impl PendingAssets {
    fn track_temp(&mut self, path: PathBuf) {
        self.temp_paths.push(path);
    }

    fn temp_consumed(&mut self, path: &Path) {
        self.temp_paths.retain(|p| p != path);
    }

    fn track_uploaded(&mut self, asset: UploadedAsset) {
        self.uploaded.push(asset);
    }

    /// Undo every side effect recorded so far. Failures are logged and
    /// swallowed; the triggering error is what the caller reports.
    async fn unwind(self, assets: &dyn AssetStore) {
        for asset in self.uploaded.iter().rev() {
            if let Err(e) = assets.delete(&asset.remote_id).await {
                warn!(remote_id = %asset.remote_id, error = %e, "compensating asset delete failed");
            }
        }
        discard_temp_files(&self.temp_paths).await;
    }
}

async fn discard_temp_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove temp file");
            }
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    let (local, domain) = match parts.as_slice() {
        [local, domain] => (*local, *domain),
        _ => return false,
    };

    if local.is_empty() {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Register a new account.
///
/// # Steps
///
/// 1. Required fields present and non-blank
/// 2. Uniqueness pre-check by username and email (optimization only; the
///    store's constraint at create-time is the real guarantee)
/// 3. Avatar file must be present
/// 4. Upload avatar, then cover (cover optional, empty-url sentinel)
/// 5. Create the record (username lowercased, password hashed by the store)
/// 6. Defensive re-read of the created record
/// 7. Remove any remaining local temp files
/// 8. Return the sanitized user
///
/// Any failure in steps 4-6 unwinds the compensation stack first.
#[instrument(skip_all, fields(username = %input.username))]
pub async fn register(
    store: &dyn CredentialStore,
    assets: &dyn AssetStore,
    input: RegistrationInput,
) -> Result<SanitizedUser, ApiError> {
    let mut missing = Vec::new();
    if input.display_name.trim().is_empty() {
        missing.push("displayName".to_string());
    }
    if input.email.trim().is_empty() {
        missing.push("email".to_string());
    }
    if input.username.trim().is_empty() {
        missing.push("username".to_string());
    }
    if input.password.expose_secret().trim().is_empty() {
        missing.push("password".to_string());
    }
    if !missing.is_empty() {
        return Err(ApiError::validation("All fields are required", missing));
    }

    let email = input.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    let username = input.username.trim().to_lowercase();

    if store.find_by_identity(&username).await?.is_some()
        || store.find_by_identity(&email).await?.is_some()
    {
        return Err(ApiError::conflict(
            "User with the email or username already exists",
        ));
    }

    let avatar_path = input
        .avatar_path
        .ok_or_else(|| ApiError::bad_request("Avatar image is missing"))?;

    let mut pending = PendingAssets::default();
    pending.track_temp(avatar_path.clone());
    if let Some(path) = &input.cover_path {
        pending.track_temp(path.clone());
    }

    pending.temp_consumed(&avatar_path);
    let avatar = match assets.upload(&avatar_path).await {
        Ok(asset) => asset,
        Err(e) => {
            pending.unwind(assets).await;
            return Err(e);
        }
    };
    pending.track_uploaded(avatar.clone());

    if avatar.url.is_empty() {
        pending.unwind(assets).await;
        return Err(ApiError::internal("Avatar upload failed"));
    }

    let cover_url = match &input.cover_path {
        Some(path) => {
            pending.temp_consumed(path);
            let cover = match assets.upload(path).await {
                Ok(asset) => asset,
                Err(e) => {
                    pending.unwind(assets).await;
                    return Err(e);
                }
            };
            pending.track_uploaded(cover.clone());

            if cover.url.is_empty() {
                pending.unwind(assets).await;
                return Err(ApiError::internal("Cover image upload failed"));
            }
            cover.url
        }
        // Cover is optional; an absent cover persists the empty-url sentinel.
        None => String::new(),
    };

    let new_user = NewUser {
        username,
        email,
        display_name: input.display_name.trim().to_string(),
        password: input.password,
        avatar_url: avatar.url.clone(),
        cover_url,
    };

    let created = match store.create(new_user).await {
        Ok(user) => user,
        Err(e) => {
            // A concurrent registration may have won the race after the
            // pre-check; the loser still compensates.
            pending.unwind(assets).await;
            return Err(e);
        }
    };

    let confirmed = match store.find_by_id(created.id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            pending.unwind(assets).await;
            return Err(ApiError::internal(
                "Something went wrong while registering the user",
            ));
        }
        Err(e) => {
            pending.unwind(assets).await;
            return Err(e);
        }
    };

    discard_temp_files(&pending.temp_paths).await;

    Ok(confirmed.sanitized())
}
