//! Error taxonomy and the boundary normalizer.
//!
//! Every failure in the service is either raised as an [`ApiError`] directly
//! or wrapped into one by the `From` conversions below. The `IntoResponse`
//! implementation is the single place where failures become wire responses,
//! so every error the client sees has the same envelope shape:
//! `{statusCode, message, errors?, stack?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

/// Whether error envelopes carry the original diagnostic trace.
///
/// Set once at startup from the loaded configuration; traces are only for
/// non-production deployments. Boundary-only state: core logic never reads it.
static EXPOSE_TRACES: OnceLock<bool> = OnceLock::new();

/// Enable or disable diagnostic traces in error envelopes. First call wins.
pub fn expose_error_traces(enabled: bool) {
    let _ = EXPOSE_TRACES.set(enabled);
}

fn traces_exposed() -> bool {
    *EXPOSE_TRACES.get().unwrap_or(&false)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String, details: Vec<String> },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        trace: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A `BadRequest` carrying per-field sub-errors.
    pub fn validation(message: impl Into<String>, details: Vec<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            trace: None,
        }
    }

    /// Wrap a foreign failure, preserving its message and keeping the debug
    /// representation as the diagnostic trace.
    pub fn from_source(source: &(dyn std::error::Error + 'static)) -> Self {
        ApiError::Internal {
            message: source.to_string(),
            trace: Some(format!("{:?}", source)),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the wire envelope. `expose_trace` is decided by the boundary;
    /// core logic never makes that call.
    fn render(&self, expose_trace: bool) -> ErrorEnvelope {
        let (details, trace) = match self {
            ApiError::BadRequest { details, .. } => (details.clone(), None),
            ApiError::Internal { trace, .. } => (Vec::new(), trace.clone()),
            _ => (Vec::new(), None),
        };

        ErrorEnvelope {
            status_code: self.status_code().as_u16(),
            message: self.to_string(),
            errors: details,
            stack: if expose_trace { trace } else { None },
        }
    }
}

/// Error envelope: `{statusCode, message, errors?, stack?}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal { .. }) {
            tracing::error!(error = %self, "request failed");
        }
        let envelope = self.render(traces_exposed());
        (self.status_code(), Json(envelope)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::from_source(&e)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::from_source(&e)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::from_source(&e)
    }
}

/// Success envelope: `{statusCode, data, message}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    status_code: u16,
    data: T,
    message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            status_code: status.as_u16(),
            data,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
