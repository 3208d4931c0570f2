//! Router construction.

use crate::handlers::{user_handler, AppState};
use crate::middleware::auth;
use axum::http::HeaderValue;
use axum::{middleware::from_fn_with_state, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Callers are expected to impose their own timeout around the whole
/// pipeline; this is the outer bound.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn cors_layer(origin: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origin == "*" {
        return base.allow_origin(Any);
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => base.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, falling back to any");
            base.allow_origin(Any)
        }
    }
}

pub fn build_routes(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/logout", post(user_handler::logout))
        .route(
            "/api/v1/users/change-password",
            post(user_handler::change_password),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/api/v1/users/register", post(user_handler::register))
        .route("/api/v1/users/login", post(user_handler::login))
        .route("/api/v1/users/refresh-token", post(user_handler::refresh))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.cors_origin))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}
