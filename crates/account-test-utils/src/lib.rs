//! Shared test utilities for the account service.
//!
//! Provides:
//! - `InMemoryCredentialStore` - credential store fake with the same
//!   conflict and validation semantics as the Postgres implementation
//! - `ScriptedAssetStore` - asset store fake with failure injection that
//!   records every upload/delete
//! - `AssetFixture` - temp files standing in for transport-written uploads
//! - `TestAccountServer` - spawns the real router on a random port
//! - `test_token_service` - a `TokenService` with fixed test secrets

pub mod asset_fixtures;
pub mod memory_store;
pub mod server_harness;

pub use asset_fixtures::{AssetFixture, ScriptedAssetStore};
pub use memory_store::InMemoryCredentialStore;
pub use server_harness::TestAccountServer;

use account_service::services::token_service::TokenService;
use secrecy::SecretString;

/// Deterministic token service for tests (fixed secrets, short access TTL).
pub fn test_token_service() -> TokenService {
    TokenService::new(
        SecretString::from("test-access-secret-test-access-secret"),
        SecretString::from("test-refresh-secret-test-refresh-secret"),
        900,
        604_800,
    )
}
