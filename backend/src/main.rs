use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use backend::config::Config;
use backend::db::{self, DetectionRepository, ImageRepository};
use backend::detector::{HttpDetector, ObjectDetector};
use backend::error::ApiError;
use backend::routes::configure_routes;
use backend::services::{DetectionService, ImageService};
use backend::storage::{FilesystemStorage, StorageBackend};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let pool = match db::connect(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Database initialization failed: {e}");
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Database initialization failed: {e}"),
            ));
        }
    };

    let filesystem = FilesystemStorage::new(config.upload_dir.clone());
    if let Err(e) = filesystem.ensure_root().await {
        log::error!("Upload directory initialization failed: {e}");
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Upload directory initialization failed: {e}"),
        ));
    }
    let storage: Arc<dyn StorageBackend> = Arc::new(filesystem);
    let detector: Arc<dyn ObjectDetector> = Arc::new(HttpDetector::new(&config));

    let images = ImageRepository::new(pool.clone());
    let detections = DetectionRepository::new(pool.clone());
    let image_service = ImageService::new(images.clone(), storage.clone(), config.max_upload_size);
    let detection_service = DetectionService::new(
        images,
        detections,
        storage,
        detector.clone(),
        config.confidence_threshold,
    );

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);
    log::info!("Storing uploads under {}", config.upload_dir.display());
    log::info!("Detection service at {}", config.detector_url);

    let frontend_dist = config.frontend_dist.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
            )
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(image_service.clone()))
            .app_data(web::Data::new(detection_service.clone()))
            .app_data(web::Data::from(detector.clone()))
            .configure(|cfg| configure_routes(cfg, frontend_dist.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
