//! User-account service library.
//!
//! Provides account provisioning (registration with external media-asset
//! uploads and compensation on failure) and the session-token lifecycle
//! (issue, rotate on refresh, invalidate on logout).
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Password hashing and verification
//! - `errors` - Error taxonomy and the boundary normalizer
//! - `models` - Data models
//! - `repositories` - Credential store interface and Postgres implementation
//! - `assets` - Asset store client interface and HTTP implementation
//! - `services` - Business logic (tokens, provisioning, sessions)
//! - `handlers` - HTTP request handlers
//! - `middleware` - Request authentication
//! - `routes` - Router construction

pub mod assets;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
