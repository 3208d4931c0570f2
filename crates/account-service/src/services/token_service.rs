//! Signed session-token issuance and verification.
//!
//! Tokens are symmetric-signed (HS256) and stateless: an access token is
//! verified without a store lookup, a refresh token is additionally checked
//! against the value mirrored on the user record by the session orchestrator.
//! There is no revocation list; overwriting or clearing the mirrored value is
//! the revocation mechanism.

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::TokenPair;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims. `jti` makes every issued token a distinct string even when two
/// are minted within the same second, which rotation depends on.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("kind", &self.kind)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenService {
    access_secret: SecretString,
    refresh_secret: SecretString,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(
        access_secret: SecretString,
        refresh_secret: SecretString,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        TokenService {
            access_secret,
            refresh_secret,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.access_token_secret.clone(),
            config.refresh_token_secret.clone(),
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        )
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    fn secret_for(&self, kind: TokenKind) -> &SecretString {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    fn issue(&self, kind: TokenKind, user_id: Uuid) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            kind: kind.as_str().to_string(),
            iat: now,
            exp: now + self.ttl_for(kind),
            jti: Uuid::new_v4().to_string(),
        };

        let key = EncodingKey::from_secret(self.secret_for(kind).expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| ApiError::internal(format!("Token signing failed: {}", e)))
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.issue(TokenKind::Access, user_id)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, ApiError> {
        self.issue(TokenKind::Refresh, user_id)
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Verify signature, kind and expiry.
    ///
    /// The error message is the same for every rejection cause so callers
    /// cannot probe which check failed.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<VerifiedToken, ApiError> {
        let invalid = || ApiError::unauthorized("The token is invalid or expired");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let key = DecodingKey::from_secret(self.secret_for(expected).expose_secret().as_bytes());
        let data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
            invalid()
        })?;

        // Each kind has its own secret, but the claim is checked as well so a
        // mixed-secret deployment still rejects a token of the wrong kind.
        if data.claims.kind != expected.as_str() {
            return Err(invalid());
        }

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| invalid())?;

        Ok(VerifiedToken {
            user_id,
            expires_at: data.claims.exp,
        })
    }
}
