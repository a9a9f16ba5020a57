use shared::{Detection, ImageStatus};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, now_micros, parse_id, parse_ts};
use crate::error::{ApiError, ApiResult};

/// One detector hit that passed screening, ready to persist.
pub struct NewDetection {
    pub label: String,
    pub confidence_score: f64,
    pub bbox_xmin: i64,
    pub bbox_ymin: i64,
    pub bbox_xmax: i64,
    pub bbox_ymax: i64,
}

/// Optional conjunctive filters for the global detections listing.
#[derive(Default)]
pub struct DetectionFilter {
    pub label: Option<String>,
    pub min_confidence: Option<f64>,
}

#[derive(Clone)]
pub struct DetectionRepository {
    pool: SqlitePool,
}

impl DetectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Swaps the image's detection set for `new` and marks the image
    /// completed, all in one transaction. A failure anywhere leaves the
    /// prior detections and status untouched.
    pub async fn replace_for_image(
        &self,
        image_id: Uuid,
        new: &[NewDetection],
    ) -> ApiResult<Vec<Detection>> {
        let mut tx = self.pool.begin().await?;
        let now = now_micros();

        sqlx::query("DELETE FROM detections WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(new.len());
        for det in new {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO detections (id, image_id, label, confidence_score, \
                 bbox_xmin, bbox_ymin, bbox_xmax, bbox_ymax, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(image_id.to_string())
            .bind(&det.label)
            .bind(det.confidence_score)
            .bind(det.bbox_xmin)
            .bind(det.bbox_ymin)
            .bind(det.bbox_xmax)
            .bind(det.bbox_ymax)
            .bind(fmt_ts(now))
            .bind(fmt_ts(now))
            .execute(&mut *tx)
            .await?;

            stored.push(Detection {
                id,
                image_id,
                label: det.label.clone(),
                confidence_score: det.confidence_score,
                bbox_xmin: det.bbox_xmin,
                bbox_ymin: det.bbox_ymin,
                bbox_xmax: det.bbox_xmax,
                bbox_ymax: det.bbox_ymax,
                created_at: now,
                updated_at: now,
            });
        }

        let marked = sqlx::query("UPDATE images SET status = ?, updated_at = ? WHERE id = ?")
            .bind(ImageStatus::Completed.to_string())
            .bind(fmt_ts(now))
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        if marked.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("image {image_id}")));
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// All detections for one image, most confident first.
    pub async fn list_for_image(&self, image_id: Uuid) -> ApiResult<Vec<Detection>> {
        let rows = sqlx::query(
            "SELECT * FROM detections WHERE image_id = ? \
             ORDER BY confidence_score DESC, id ASC",
        )
        .bind(image_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(detection_from_row).collect()
    }

    pub async fn list(
        &self,
        filter: &DetectionFilter,
        page: u32,
        page_size: u32,
    ) -> ApiResult<(i64, Vec<Detection>)> {
        let mut clauses = Vec::new();
        if filter.label.is_some() {
            clauses.push("label = ?");
        }
        if filter.min_confidence.is_some() {
            clauses.push("confidence_score >= ?");
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS n FROM detections{where_sql}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(label) = &filter.label {
            count_query = count_query.bind(label);
        }
        if let Some(min) = filter.min_confidence {
            count_query = count_query.bind(min);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get("n")?;

        let select_sql = format!(
            "SELECT * FROM detections{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut select_query = sqlx::query(&select_sql);
        if let Some(label) = &filter.label {
            select_query = select_query.bind(label);
        }
        if let Some(min) = filter.min_confidence {
            select_query = select_query.bind(min);
        }
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = select_query
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(detection_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok((total, records))
    }
}

pub(crate) fn detection_from_row(row: &SqliteRow) -> ApiResult<Detection> {
    Ok(Detection {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        image_id: parse_id(&row.try_get::<String, _>("image_id")?)?,
        label: row.try_get("label")?,
        confidence_score: row.try_get("confidence_score")?,
        bbox_xmin: row.try_get("bbox_xmin")?,
        bbox_ymin: row.try_get("bbox_ymin")?,
        bbox_xmax: row.try_get("bbox_xmax")?,
        bbox_ymax: row.try_get("bbox_ymax")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}
