//! SQLite metadata store. Ids and timestamps are stored as TEXT (UUID
//! hyphenated, RFC-3339 at fixed microsecond precision) so that string
//! comparison on `created_at` matches chronological order for pagination.

mod detection_repository;
mod image_repository;

pub use detection_repository::{DetectionFilter, DetectionRepository, NewDetection};
pub use image_repository::{ImageFilter, ImageRepository, NewImage};

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub async fn connect(database_path: &Path) -> ApiResult<SqlitePool> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Storage(format!("could not create database dir: {e}")))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Current time truncated to microseconds, so the value we hand back to
/// callers is byte-identical to what a later read of the stored row yields.
pub(crate) fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::parse_from_rfc3339(&fmt_ts(now))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Corrupt(format!("timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Corrupt(format!("uuid {raw:?}: {e}")))
}
