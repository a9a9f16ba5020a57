use shared::{ImageRecord, ImageStatus};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, now_micros, parse_id, parse_ts};
use crate::error::{ApiError, ApiResult};

/// Metadata for a freshly stored file, before it has a row.
pub struct NewImage {
    pub filename: String,
    pub storage_path: String,
    pub file_size: i64,
}

/// Optional conjunctive filters for image listings.
#[derive(Default)]
pub struct ImageFilter {
    pub status: Option<ImageStatus>,
    pub filename_substr: Option<String>,
}

#[derive(Clone)]
pub struct ImageRepository {
    pool: SqlitePool,
}

impl ImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new: NewImage) -> ApiResult<ImageRecord> {
        let id = Uuid::new_v4();
        let now = now_micros();
        sqlx::query(
            "INSERT INTO images (id, filename, storage_path, file_size, status, \
             upload_timestamp, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&new.filename)
        .bind(&new.storage_path)
        .bind(new.file_size)
        .bind(ImageStatus::Pending.to_string())
        .bind(fmt_ts(now))
        .bind(fmt_ts(now))
        .bind(fmt_ts(now))
        .execute(&self.pool)
        .await?;

        Ok(ImageRecord {
            id,
            filename: new.filename,
            storage_path: new.storage_path,
            file_size: new.file_size,
            status: ImageStatus::Pending,
            upload_timestamp: now,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Option<ImageRecord>> {
        let row = sqlx::query("SELECT * FROM images WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| image_from_row(&r)).transpose()
    }

    pub async fn storage_path_taken(&self, storage_path: &str) -> ApiResult<bool> {
        let row = sqlx::query("SELECT 1 FROM images WHERE storage_path = ?")
            .bind(storage_path)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Count plus one page of records, newest first. Ties on `created_at`
    /// break on `id` so page boundaries are stable across requests.
    pub async fn list(
        &self,
        filter: &ImageFilter,
        page: u32,
        page_size: u32,
    ) -> ApiResult<(i64, Vec<ImageRecord>)> {
        let mut clauses = Vec::new();
        if filter.status.is_some() {
            clauses.push("status = ?");
        }
        if filter.filename_substr.is_some() {
            clauses.push("instr(lower(filename), lower(?)) > 0");
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS n FROM images{where_sql}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.to_string());
        }
        if let Some(substr) = &filter.filename_substr {
            count_query = count_query.bind(substr);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get("n")?;

        let select_sql = format!(
            "SELECT * FROM images{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut select_query = sqlx::query(&select_sql);
        if let Some(status) = filter.status {
            select_query = select_query.bind(status.to_string());
        }
        if let Some(substr) = &filter.filename_substr {
            select_query = select_query.bind(substr);
        }
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = select_query
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(image_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok((total, records))
    }

    /// Marks the image as processing unless another analysis already holds
    /// it. Returns false when the claim lost, so callers can answer 409.
    pub async fn claim_processing(&self, id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE images SET status = ?, updated_at = ? \
             WHERE id = ? AND status != ?",
        )
        .bind(ImageStatus::Processing.to_string())
        .bind(fmt_ts(now_micros()))
        .bind(id.to_string())
        .bind(ImageStatus::Processing.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(&self, id: Uuid, status: ImageStatus) -> ApiResult<()> {
        let result = sqlx::query("UPDATE images SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(fmt_ts(now_micros()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("image {id}")));
        }
        Ok(())
    }

    /// Detections go with the image via ON DELETE CASCADE.
    pub async fn delete(&self, id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn image_from_row(row: &SqliteRow) -> ApiResult<ImageRecord> {
    let status_raw: String = row.try_get("status")?;
    let status = status_raw
        .parse::<ImageStatus>()
        .map_err(|_| ApiError::Corrupt(format!("image status {status_raw:?}")))?;
    Ok(ImageRecord {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        filename: row.try_get("filename")?,
        storage_path: row.try_get("storage_path")?,
        file_size: row.try_get("file_size")?,
        status,
        upload_timestamp: parse_ts(&row.try_get::<String, _>("upload_timestamp")?)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}
