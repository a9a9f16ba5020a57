use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shared::DEFAULT_PAGE_SIZE;

use super::parse_image_id;
use crate::error::ApiResult;
use crate::services::DetectionService;

#[derive(Deserialize)]
pub struct DetectionListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    label: Option<String>,
    min_confidence: Option<f64>,
}

pub async fn analyze_image(
    service: web::Data<DetectionService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_image_id(&path.into_inner())?;
    let detections = service.analyze(id).await?;
    Ok(HttpResponse::Created().json(detections))
}

pub async fn list_image_detections(
    service: web::Data<DetectionService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_image_id(&path.into_inner())?;
    let detections = service.detections_for_image(id).await?;
    Ok(HttpResponse::Ok().json(detections))
}

pub async fn list_detections(
    service: web::Data<DetectionService>,
    query: web::Query<DetectionListQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let page = service
        .list(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
            query.label,
            query.min_confidence,
        )
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
