mod detections;
mod health;
mod images;

use actix_files::Files;
use actix_web::web;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Registers the whole HTTP surface. `/images/upload` has to come before
/// the `{image_id}` resources so "upload" is never captured as an id.
pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/images/upload").route(web::post().to(images::upload_image)))
            .service(web::resource("/images").route(web::get().to(images::list_images)))
            .service(
                web::resource("/images/{image_id}")
                    .route(web::get().to(images::get_image))
                    .route(web::delete().to(images::delete_image)),
            )
            .service(
                web::resource("/images/{image_id}/file")
                    .route(web::get().to(images::download_image_file)),
            )
            .service(
                web::resource("/images/{image_id}/analyze")
                    .route(web::post().to(detections::analyze_image)),
            )
            .service(
                web::resource("/images/{image_id}/detections")
                    .route(web::get().to(detections::list_image_detections)),
            )
            .service(web::resource("/detections").route(web::get().to(detections::list_detections))),
    )
    .service(web::resource("/health").route(web::get().to(health::health_check)))
    .service(web::resource("/health/ready").route(web::get().to(health::readiness_check)))
    .service(Files::new("/", frontend_dir).index_file("index.html"));
}

pub(crate) fn parse_image_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("invalid image id {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ids_must_be_uuids() {
        assert!(parse_image_id("upload").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_image_id(&id.to_string()).unwrap(), id);
    }
}
