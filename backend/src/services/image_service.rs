use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use shared::{ImageRecord, ImageStatus, PaginatedResponse};
use uuid::Uuid;

use super::validate_page_params;
use crate::db::{ImageFilter, ImageRepository, NewImage};
use crate::error::{ApiError, ApiResult};
use crate::files;
use crate::storage::{storage_path_for, StorageBackend};

/// Upload, lookup, listing and deletion of images. Owns the invariant that
/// a metadata row never points at a file that was not written first.
#[derive(Clone)]
pub struct ImageService {
    repo: ImageRepository,
    storage: Arc<dyn StorageBackend>,
    max_upload_size: u64,
}

impl ImageService {
    pub fn new(repo: ImageRepository, storage: Arc<dyn StorageBackend>, max_upload_size: u64) -> Self {
        Self {
            repo,
            storage,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Validates, stores and registers one uploaded file. The file is
    /// written before the row is inserted; if the insert fails the file is
    /// removed again so no orphan survives a failed upload.
    pub async fn upload(&self, original_filename: &str, data: Vec<u8>) -> ApiResult<ImageRecord> {
        if !files::extension_allowed(original_filename) {
            let ext = files::file_extension(original_filename).unwrap_or_else(|| "none".into());
            return Err(ApiError::UnsupportedMediaType(format!(
                "file extension {ext:?} is not one of: {}",
                files::ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        if data.is_empty() {
            return Err(ApiError::Validation("uploaded file is empty".into()));
        }
        if data.len() as u64 > self.max_upload_size {
            return Err(ApiError::PayloadTooLarge {
                limit: self.max_upload_size,
            });
        }

        let sanitized = files::sanitize_filename(original_filename);
        let hash = files::content_hash(&data);
        let now = Utc::now();

        let mut path = storage_path_for(&hash, &sanitized, now, None);
        if self.repo.storage_path_taken(&path).await? {
            let tag = format!("{:04x}", rand::rng().random_range(0..0x1_0000u32));
            path = storage_path_for(&hash, &sanitized, now, Some(&tag));
            if self.repo.storage_path_taken(&path).await? {
                return Err(ApiError::Conflict(format!(
                    "storage path for {sanitized:?} is already taken"
                )));
            }
        }

        self.storage.save(&path, &data).await?;

        let new = NewImage {
            filename: sanitized,
            storage_path: path.clone(),
            file_size: data.len() as i64,
        };
        let record = match self.repo.insert(new).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&path).await {
                    log::warn!("could not remove {path} after failed insert: {cleanup}");
                }
                return Err(e);
            }
        };

        log::info!(
            "stored image {} ({} bytes) at {}",
            record.id,
            record.file_size,
            record.storage_path
        );
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<ImageRecord> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("image {id}")))
    }

    /// The stored bytes plus their record, for the raw-file endpoint.
    pub async fn raw_file(&self, id: Uuid) -> ApiResult<(ImageRecord, Vec<u8>)> {
        let record = self.get(id).await?;
        if !self.storage.exists(&record.storage_path).await? {
            return Err(ApiError::NotFound(format!("file for image {id}")));
        }
        let bytes = self.storage.get(&record.storage_path).await?;
        Ok((record, bytes))
    }

    /// Removes the row (detections cascade with it) and then the file. A
    /// file that refuses to go only gets a warning; the metadata is gone
    /// and that is what the caller observes.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let record = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(ApiError::NotFound(format!("image {id}")));
        }
        if let Err(e) = self.storage.delete(&record.storage_path).await {
            log::warn!("could not remove stored file {}: {e}", record.storage_path);
        }
        log::info!("deleted image {id}");
        Ok(())
    }

    pub async fn list(
        &self,
        page: i64,
        page_size: i64,
        status: Option<String>,
        filename_substr: Option<String>,
    ) -> ApiResult<PaginatedResponse<ImageRecord>> {
        let (page, page_size) = validate_page_params(page, page_size)?;
        let status = status
            .map(|s| {
                s.parse::<ImageStatus>()
                    .map_err(|_| ApiError::Validation(format!("unknown status {s:?}")))
            })
            .transpose()?;
        if let Some(substr) = &filename_substr {
            if substr.trim().is_empty() {
                return Err(ApiError::Validation(
                    "filename filter must not be empty".into(),
                ));
            }
        }

        let filter = ImageFilter {
            status,
            filename_substr,
        };
        let (total, items) = self.repo.list(&filter, page, page_size).await?;
        Ok(PaginatedResponse::new(items, total, page, page_size))
    }
}
