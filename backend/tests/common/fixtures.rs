use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use backend::db::{self, DetectionRepository, ImageRepository};
use backend::detector::{ObjectDetector, RawDetection};
use backend::error::{ApiError, ApiResult};
use backend::services::{DetectionService, ImageService};
use backend::storage::{FilesystemStorage, StorageBackend};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use shared::BoundingBox;
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

pub const TEST_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;
pub const TEST_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Detector stand-in whose responses tests can change between calls.
#[derive(Default)]
pub struct StubDetector {
    responses: Mutex<Vec<RawDetection>>,
    fail: AtomicBool,
}

impl StubDetector {
    pub fn set_detections(&self, detections: Vec<RawDetection>) {
        *self.responses.lock().unwrap() = detections;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectDetector for StubDetector {
    async fn detect(&self, _image_bytes: &[u8], _media_type: &str) -> ApiResult<Vec<RawDetection>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Upstream("stub detector offline".into()));
        }
        Ok(self.responses.lock().unwrap().clone())
    }

    async fn healthy(&self) -> ApiResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Upstream("stub detector offline".into()));
        }
        Ok(())
    }
}

/// Everything one test needs: services, repositories, the raw pool for row
/// assertions, and the temp dir keeping files and database alive.
pub struct TestHarness {
    pub images: ImageService,
    pub detections: DetectionService,
    pub image_repo: ImageRepository,
    pub detection_repo: DetectionRepository,
    pub detector: Arc<StubDetector>,
    pub storage: Arc<dyn StorageBackend>,
    pub pool: SqlitePool,
    pub dir: TempDir,
}

pub async fn harness() -> TestHarness {
    let dir = TempDir::new().expect("temp dir");
    let pool = db::connect(&dir.path().join("test.db"))
        .await
        .expect("database setup");

    let filesystem = FilesystemStorage::new(dir.path().join("uploads"));
    filesystem.ensure_root().await.expect("upload root");
    let storage: Arc<dyn StorageBackend> = Arc::new(filesystem);
    let detector = Arc::new(StubDetector::default());

    let image_repo = ImageRepository::new(pool.clone());
    let detection_repo = DetectionRepository::new(pool.clone());
    let images = ImageService::new(image_repo.clone(), storage.clone(), TEST_MAX_UPLOAD_SIZE);
    let detections = DetectionService::new(
        image_repo.clone(),
        detection_repo.clone(),
        storage.clone(),
        detector.clone(),
        TEST_CONFIDENCE_THRESHOLD,
    );

    TestHarness {
        images,
        detections,
        image_repo,
        detection_repo,
        detector,
        storage,
        pool,
        dir,
    }
}

/// In-memory PNG with pattern pixels, large enough for preprocessing.
pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode test png");
    buf
}

pub fn raw_detection(label: &str, score: f64, bbox: (i64, i64, i64, i64)) -> RawDetection {
    RawDetection {
        label: label.to_string(),
        score,
        bbox: BoundingBox {
            xmin: bbox.0,
            ymin: bbox.1,
            xmax: bbox.2,
            ymax: bbox.3,
        },
    }
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) AS n FROM {table}");
    sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .expect("count query")
        .try_get("n")
        .expect("count column")
}

