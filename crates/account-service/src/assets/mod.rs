//! Asset store client interface.
//!
//! Only the contract the provisioning pipeline needs: upload a local file,
//! delete a remote asset. Uploads are exactly-once-attempt with
//! at-least-once local cleanup; deletes are idempotent and used for
//! best-effort compensation.

use crate::errors::ApiError;
use async_trait::async_trait;
use std::path::Path;

pub mod http_client;

pub use http_client::HttpAssetStore;

/// A successfully uploaded remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub remote_id: String,
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload the file at `local_path`.
    ///
    /// The local file is removed after the attempt regardless of outcome.
    async fn upload(&self, local_path: &Path) -> Result<UploadedAsset, ApiError>;

    /// Delete a remote asset. A missing or already-deleted asset is success;
    /// real failures surface so the caller can log them, but compensation
    /// never propagates them.
    async fn delete(&self, remote_id: &str) -> Result<(), ApiError>;
}
