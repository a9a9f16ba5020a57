use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StorageBackend;
use crate::error::{ApiError, ApiResult};

/// Local-filesystem backend rooted at the configured upload directory.
/// Writes are atomic: bytes go to a temp file that is renamed into place,
/// so a crash never leaves a partial file at the final path.
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> ApiResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ApiError::Storage(format!("could not create upload root: {e}")))?;
        log::info!("upload root ready: {}", self.root.display());
        Ok(())
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    async fn save(&self, path: &str, data: &[u8]) -> ApiResult<()> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Storage(format!("could not create {path}: {e}")))?;
        }

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| ApiError::Storage(format!("could not create {path}: {e}")))?;
        file.write_all(data)
            .await
            .map_err(|e| ApiError::Storage(format!("could not write {path}: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| ApiError::Storage(format!("could not sync {path}: {e}")))?;
        drop(file);

        fs::rename(&temp_path, &full_path)
            .await
            .map_err(|e| ApiError::Storage(format!("could not finalize {path}: {e}")))?;
        Ok(())
    }

    async fn get(&self, path: &str) -> ApiResult<Vec<u8>> {
        fs::read(self.full_path(path))
            .await
            .map_err(|e| ApiError::Storage(format!("could not read {path}: {e}")))
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("delete of missing file {path}");
                Ok(())
            }
            Err(e) => Err(ApiError::Storage(format!("could not delete {path}: {e}"))),
        }
    }

    async fn exists(&self, path: &str) -> ApiResult<bool> {
        match fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ApiError::Storage(format!("could not stat {path}: {e}"))),
        }
    }
}
