//! HTTP client for the external media-asset service.

use crate::assets::{AssetStore, UploadedAsset};
use crate::config::AppConfig;
use crate::errors::ApiError;
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
    url: String,
}

pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpAssetStore {
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            config.asset_store_url.clone(),
            config.asset_store_api_key.clone(),
        )
    }

    pub fn new(base_url: String, api_key: SecretString) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpAssetStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn try_upload(&self, local_path: &Path) -> Result<UploadedAsset, ApiError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to read asset file: {}", e)))?;

        let response = self
            .client
            .post(format!("{}/assets", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::internal(format!(
                "Asset upload failed with status {}",
                status
            )));
        }

        let body: UploadResponse = response.json().await?;
        debug!(remote_id = %body.id, "asset uploaded");

        Ok(UploadedAsset {
            remote_id: body.id,
            url: body.url,
        })
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    #[instrument(skip(self), fields(path = %local_path.display()))]
    async fn upload(&self, local_path: &Path) -> Result<UploadedAsset, ApiError> {
        let result = self.try_upload(local_path).await;

        // The local temp file goes away whether or not the upload landed.
        if let Err(e) = tokio::fs::remove_file(local_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %local_path.display(), error = %e, "failed to remove local asset file");
            }
        }

        result
    }

    #[instrument(skip(self))]
    async fn delete(&self, remote_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, remote_id))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        // Already gone counts as deleted.
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!(remote_id, "asset deleted");
            return Ok(());
        }

        Err(ApiError::internal(format!(
            "Asset delete failed with status {}",
            status
        )))
    }
}
