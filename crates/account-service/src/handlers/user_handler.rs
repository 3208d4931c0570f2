//! Account and session endpoints.
//!
//! Handlers stay thin: they adapt parsed request fields to the service layer
//! and wrap results in the response envelope. The transport delivers uploaded
//! files as local temp paths (the upload middleware ahead of this service
//! writes them); handlers never touch file contents.

use crate::assets::AssetStore;
use crate::errors::{ApiError, ApiResponse};
use crate::handlers::cookies::{
    self, CookieOptions, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::middleware::auth::CurrentUser;
use crate::models::{SanitizedUser, TokenPair};
use crate::repositories::CredentialStore;
use crate::services::token_service::TokenService;
use crate::services::{provisioning, session};
use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::{Extension, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across handlers.
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub assets: Arc<dyn AssetStore>,
    pub tokens: TokenService,
    pub cookie_options: CookieOptions,
    pub cors_origin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub avatar_path: Option<PathBuf>,
    pub cover_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<SecretString>,
    pub new_password: Option<SecretString>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    user: SanitizedUser,
    access_token: String,
    refresh_token: String,
}

/// POST /api/v1/users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let input = provisioning::RegistrationInput {
        display_name: payload.display_name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        username: payload.username.unwrap_or_default(),
        password: payload.password.unwrap_or_else(|| SecretString::from("")),
        avatar_path: payload.avatar_path,
        cover_path: payload.cover_path,
    };

    let user = provisioning::register(state.store.as_ref(), state.assets.as_ref(), input).await?;

    Ok(ApiResponse::new(StatusCode::CREATED, user, "User registered successfully")
        .into_response())
}

fn session_cookies(
    state: &AppState,
    tokens: &TokenPair,
) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            cookies::session_cookie(
                ACCESS_TOKEN_COOKIE,
                &tokens.access_token,
                state.tokens.access_ttl_secs(),
                state.cookie_options,
            ),
        ),
        (
            SET_COOKIE,
            cookies::session_cookie(
                REFRESH_TOKEN_COOKIE,
                &tokens.refresh_token,
                state.tokens.refresh_ttl_secs(),
                state.cookie_options,
            ),
        ),
    ])
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let input = session::LoginInput {
        email: payload.email,
        username: payload.username,
        password: payload.password,
    };

    let out = session::login(state.store.as_ref(), &state.tokens, input).await?;

    let headers = session_cookies(&state, &out.tokens);
    let body = ApiResponse::new(
        StatusCode::OK,
        SessionBody {
            user: out.user,
            access_token: out.tokens.access_token,
            refresh_token: out.tokens.refresh_token,
        },
        "User logged in successfully",
    );

    Ok((headers, body).into_response())
}

/// POST /api/v1/users/refresh-token
///
/// The incoming refresh token is read from the `refreshToken` cookie, falling
/// back to the request body.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Response, ApiError> {
    let incoming = cookies::cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| payload.and_then(|Json(p)| p.refresh_token));

    let out = session::refresh(state.store.as_ref(), &state.tokens, incoming).await?;

    let cookie_headers = session_cookies(&state, &out.tokens);
    let body = ApiResponse::new(
        StatusCode::OK,
        SessionBody {
            user: out.user,
            access_token: out.tokens.access_token,
            refresh_token: out.tokens.refresh_token,
        },
        "Access token refreshed",
    );

    Ok((cookie_headers, body).into_response())
}

/// POST /api/v1/users/logout (authenticated)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    session::logout(state.store.as_ref(), current.user_id).await?;

    let headers = AppendHeaders([
        (
            SET_COOKIE,
            cookies::expired_cookie(ACCESS_TOKEN_COOKIE, state.cookie_options),
        ),
        (
            SET_COOKIE,
            cookies::expired_cookie(REFRESH_TOKEN_COOKIE, state.cookie_options),
        ),
    ]);
    let body = ApiResponse::new(
        StatusCode::OK,
        serde_json::json!({}),
        "User logged out successfully",
    );

    Ok((headers, body).into_response())
}

/// POST /api/v1/users/change-password (authenticated)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    session::change_password(
        state.store.as_ref(),
        current.user_id,
        payload.old_password,
        payload.new_password,
    )
    .await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        serde_json::json!({}),
        "Password changed successfully",
    )
    .into_response())
}
