//! Test server harness.
//!
//! Spawns the real router (real handlers, middleware, normalizer) backed by
//! the in-memory store and the scripted asset store, bound to a random port.
//!
//! # Example
//! ```rust,ignore
//! let server = TestAccountServer::spawn().await?;
//! let response = server
//!     .client()
//!     .post(format!("{}/api/v1/users/login", server.url()))
//!     .json(&credentials)
//!     .send()
//!     .await?;
//! assert_eq!(response.status(), 200);
//! ```

use crate::{test_token_service, InMemoryCredentialStore, ScriptedAssetStore};
use account_service::handlers::cookies::CookieOptions;
use account_service::handlers::AppState;
use account_service::routes;
use account_service::services::token_service::TokenService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct TestAccountServer {
    addr: SocketAddr,
    pub store: Arc<InMemoryCredentialStore>,
    pub assets: Arc<ScriptedAssetStore>,
    pub tokens: TokenService,
    _handle: JoinHandle<()>,
}

impl TestAccountServer {
    /// Spawn a server on `127.0.0.1:0` and return it with handles to the
    /// fakes behind it.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let store = Arc::new(InMemoryCredentialStore::new());
        let assets = Arc::new(ScriptedAssetStore::new());
        let tokens = test_token_service();

        let state = Arc::new(AppState {
            store: store.clone(),
            assets: assets.clone(),
            tokens: tokens.clone(),
            cookie_options: CookieOptions { secure: false },
            cors_origin: "*".to_string(),
        });

        let app = routes::build_routes(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("test server error: {}", e);
            }
        });

        Ok(TestAccountServer {
            addr,
            store,
            assets,
            tokens,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }
}
