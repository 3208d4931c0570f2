//! Asset-store fake and local-file fixtures.

use account_service::assets::{AssetStore, UploadedAsset};
use account_service::errors::ApiError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;

/// Asset store fake. Records every call and honors the upload contract
/// (the local file is removed after the attempt regardless of outcome), so
/// compensation tests can assert both remote and local cleanup.
#[derive(Default)]
pub struct ScriptedAssetStore {
    counter: AtomicU64,
    uploads: Mutex<Vec<UploadedAsset>>,
    deletes: Mutex<Vec<String>>,
    fail_upload_pattern: Mutex<Option<String>>,
    fail_deletes: AtomicBool,
}

impl ScriptedAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads whose file name contains `pattern`.
    pub fn fail_uploads_containing(&self, pattern: &str) {
        *self
            .fail_upload_pattern
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(pattern.to_string());
    }

    /// Make remote deletes fail, for asserting that compensation failures
    /// are swallowed.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn uploaded_ids(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.remote_id.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AssetStore for ScriptedAssetStore {
    async fn upload(&self, local_path: &Path) -> Result<UploadedAsset, ApiError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Contract: the attempt consumes the local file either way.
        if let Err(e) = tokio::fs::remove_file(local_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(ApiError::from(e));
            }
        }

        let should_fail = self
            .fail_upload_pattern
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|pattern| file_name.contains(pattern));
        if should_fail {
            return Err(ApiError::internal(format!(
                "Asset store rejected upload of {}",
                file_name
            )));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let asset = UploadedAsset {
            remote_id: format!("asset-{}", n),
            url: format!("https://assets.test/asset-{}", n),
        };
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(asset.clone());

        Ok(asset)
    }

    async fn delete(&self, remote_id: &str) -> Result<(), ApiError> {
        self.deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(remote_id.to_string());

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ApiError::internal("Asset store rejected delete"));
        }
        Ok(())
    }
}

/// A temp directory of files standing in for the transport's uploaded-file
/// temp paths.
pub struct AssetFixture {
    dir: TempDir,
}

impl AssetFixture {
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created; fixtures are
    /// test-only.
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        AssetFixture {
            dir: tempfile::tempdir().expect("failed to create fixture dir"),
        }
    }

    /// Write a file and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[allow(clippy::expect_used)]
    pub fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }
}

impl Default for AssetFixture {
    fn default() -> Self {
        Self::new()
    }
}
