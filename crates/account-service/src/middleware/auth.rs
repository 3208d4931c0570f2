//! Access-token authentication middleware.

use crate::errors::ApiError;
use crate::handlers::cookies::{self, ACCESS_TOKEN_COOKIE};
use crate::handlers::AppState;
use crate::services::token_service::TokenKind;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// The authenticated caller, inserted into request extensions for handlers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Validate the access token from the `Authorization` header or the
/// `accessToken` cookie. Stateless: no store lookup.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .or_else(|| cookies::cookie_value(req.headers(), ACCESS_TOKEN_COOKIE))
        .ok_or_else(|| ApiError::unauthorized("Missing access token"))?;

    let verified = state.tokens.verify(&token, TokenKind::Access)?;

    req.extensions_mut().insert(CurrentUser {
        user_id: verified.user_id,
    });

    Ok(next.run(req).await)
}
