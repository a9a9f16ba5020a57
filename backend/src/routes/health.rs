use actix_web::{web, HttpResponse};
use log::warn;
use serde_json::json;
use sqlx::SqlitePool;

use crate::detector::ObjectDetector;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "object-detection-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probes the two collaborators requests actually depend on: the
/// database and the detection service. Either one failing yields a 503 with
/// the per-check outcomes spelled out.
pub async fn readiness_check(
    pool: web::Data<SqlitePool>,
    detector: web::Data<dyn ObjectDetector>,
) -> HttpResponse {
    let database = match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };
    let detector_state = match detector.healthy().await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };

    let checks = json!({ "database": database, "detector": detector_state });
    if database == "ok" && detector_state == "ok" {
        HttpResponse::Ok().json(json!({ "status": "ready", "checks": checks }))
    } else {
        warn!("readiness check failed: {checks}");
        HttpResponse::ServiceUnavailable().json(json!({ "status": "not_ready", "checks": checks }))
    }
}
