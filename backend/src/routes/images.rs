use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use shared::DEFAULT_PAGE_SIZE;

use super::parse_image_id;
use crate::error::{ApiError, ApiResult};
use crate::files;
use crate::services::ImageService;

#[derive(Deserialize)]
pub struct ImageListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    status: Option<String>,
    filename_substr: Option<String>,
}

pub async fn upload_image(
    service: web::Data<ImageService>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("file") {
            // Drain unrelated fields so the stream stays consumable.
            while field.next().await.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation("file part carries no filename".into()))?;

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::Validation(format!("malformed multipart payload: {e}")))?;
            data.extend_from_slice(&chunk);
            if data.len() as u64 > service.max_upload_size() {
                return Err(ApiError::PayloadTooLarge {
                    limit: service.max_upload_size(),
                });
            }
        }
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload
        .ok_or_else(|| ApiError::Validation("multipart field \"file\" is required".into()))?;
    let record = service.upload(&filename, data).await?;
    Ok(HttpResponse::Created().json(record))
}

pub async fn get_image(
    service: web::Data<ImageService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_image_id(&path.into_inner())?;
    let record = service.get(id).await?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn list_images(
    service: web::Data<ImageService>,
    query: web::Query<ImageListQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let page = service
        .list(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
            query.status,
            query.filename_substr,
        )
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn download_image_file(
    service: web::Data<ImageService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_image_id(&path.into_inner())?;
    let (record, bytes) = service.raw_file(id).await?;
    Ok(HttpResponse::Ok()
        .content_type(files::media_type_for(&record.storage_path))
        .insert_header((
            "Content-Disposition",
            format!("inline; filename=\"{}\"", record.filename),
        ))
        .body(bytes))
}

pub async fn delete_image(
    service: web::Data<ImageService>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_image_id(&path.into_inner())?;
    service.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
