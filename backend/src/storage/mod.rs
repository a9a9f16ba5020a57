//! Blob storage behind a `save/get/delete/exists` contract. The metadata
//! store only ever sees relative storage paths produced by
//! [`storage_path_for`]; how the bytes land on disk is the backend's
//! business.

mod filesystem;

pub use filesystem::FilesystemStorage;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use crate::error::ApiResult;
use crate::files;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn save(&self, path: &str, data: &[u8]) -> ApiResult<()>;
    async fn get(&self, path: &str) -> ApiResult<Vec<u8>>;
    async fn delete(&self, path: &str) -> ApiResult<()>;
    async fn exists(&self, path: &str) -> ApiResult<bool>;
}

/// Deterministic relative storage path:
/// `YYYY/MM/DD/<hash8>_<sanitized-stem><ext>`, with an optional collision
/// disambiguator appended to the stem.
pub fn storage_path_for(
    content_hash: &str,
    sanitized_name: &str,
    when: DateTime<Utc>,
    disambiguator: Option<&str>,
) -> String {
    let hash_prefix = content_hash.get(..8).unwrap_or(content_hash);
    let (stem, suffix) = files::split_suffix(sanitized_name);
    let date_dir = format!("{:04}/{:02}/{:02}", when.year(), when.month(), when.day());
    match disambiguator {
        Some(tag) => format!("{date_dir}/{hash_prefix}_{stem}_{tag}{suffix}"),
        None => format!("{date_dir}/{hash_prefix}_{stem}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn path_is_date_partitioned_with_hash_prefix() {
        let when = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let hash = "a3f2b1c9deadbeef".to_string() + &"0".repeat(48);
        let path = storage_path_for(&hash, "photo.jpg", when, None);
        assert_eq!(path, "2025/03/07/a3f2b1c9_photo.jpg");
    }

    #[test]
    fn disambiguator_lands_before_the_extension() {
        let when = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let path = storage_path_for("abcdef0123456789", "photo.jpg", when, Some("9f3a"));
        assert_eq!(path, "2025/03/07/abcdef01_photo_9f3a.jpg");
    }

    #[test]
    fn same_content_and_name_map_to_the_same_path() {
        let when = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let a = storage_path_for("11112222", "cat.png", when, None);
        let b = storage_path_for("11112222", "cat.png", when, None);
        assert_eq!(a, b);
    }

    #[test]
    fn extensionless_names_still_get_a_path() {
        let when = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let path = storage_path_for("ffff0000", "unnamed_file", when, None);
        assert_eq!(path, "2025/01/02/ffff0000_unnamed_file");
    }
}
