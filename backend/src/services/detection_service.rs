use std::cmp::Ordering;
use std::sync::Arc;

use shared::{Detection, ImageRecord, ImageStatus, PaginatedResponse};
use uuid::Uuid;

use super::validate_page_params;
use crate::db::{DetectionFilter, DetectionRepository, ImageRepository, NewDetection};
use crate::detector::{ObjectDetector, RawDetection};
use crate::error::{ApiError, ApiResult};
use crate::imaging;
use crate::storage::StorageBackend;

/// Runs the analysis pipeline and serves detection queries. The detector is
/// handed in at construction; nothing here knows which implementation it is.
#[derive(Clone)]
pub struct DetectionService {
    images: ImageRepository,
    detections: DetectionRepository,
    storage: Arc<dyn StorageBackend>,
    detector: Arc<dyn ObjectDetector>,
    confidence_threshold: f64,
}

impl DetectionService {
    pub fn new(
        images: ImageRepository,
        detections: DetectionRepository,
        storage: Arc<dyn StorageBackend>,
        detector: Arc<dyn ObjectDetector>,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            images,
            detections,
            storage,
            detector,
            confidence_threshold,
        }
    }

    /// Analyzes one image end to end. Exactly one caller can hold the
    /// processing claim at a time; losers get a conflict. Any pipeline
    /// failure flips the image to `failed` before the error propagates,
    /// leaving prior detections untouched.
    pub async fn analyze(&self, image_id: Uuid) -> ApiResult<Vec<Detection>> {
        let record = self
            .images
            .get(image_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("image {image_id}")))?;
        if !self.storage.exists(&record.storage_path).await? {
            return Err(ApiError::Storage(format!(
                "stored file for image {image_id} is missing"
            )));
        }
        if !self.images.claim_processing(image_id).await? {
            return Err(ApiError::Conflict(format!(
                "image {image_id} is already being analyzed"
            )));
        }

        match self.run_pipeline(&record).await {
            Ok(stored) => {
                log::info!(
                    "analysis of image {image_id} stored {} detections",
                    stored.len()
                );
                Ok(stored)
            }
            Err(e) => {
                log::error!("analysis of image {image_id} failed: {e}");
                if let Err(mark) = self.images.set_status(image_id, ImageStatus::Failed).await {
                    log::error!("could not mark image {image_id} as failed: {mark}");
                }
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, record: &ImageRecord) -> ApiResult<Vec<Detection>> {
        let bytes = self.storage.get(&record.storage_path).await?;
        let prepared = imaging::prepare_for_detection(&bytes)?;
        let raw = self
            .detector
            .detect(&prepared.png_bytes, "image/png")
            .await?;
        let kept = self.select_candidates(raw);
        self.detections.replace_for_image(record.id, &kept).await
    }

    /// Drops malformed boxes and out-of-range or sub-threshold scores, then
    /// orders what is left by confidence descending.
    fn select_candidates(&self, raw: Vec<RawDetection>) -> Vec<NewDetection> {
        let mut kept = Vec::new();
        for candidate in raw {
            if !candidate.bbox.is_valid() {
                log::warn!(
                    "dropping detection {:?} with malformed box {:?}",
                    candidate.label,
                    candidate.bbox
                );
                continue;
            }
            if !(0.0..=1.0).contains(&candidate.score)
                || candidate.score < self.confidence_threshold
            {
                continue;
            }
            kept.push(NewDetection {
                label: candidate.label,
                confidence_score: candidate.score,
                bbox_xmin: candidate.bbox.xmin,
                bbox_ymin: candidate.bbox.ymin,
                bbox_xmax: candidate.bbox.xmax,
                bbox_ymax: candidate.bbox.ymax,
            });
        }
        kept.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(Ordering::Equal)
        });
        kept
    }

    /// A missing image is an error here; an analyzed image with nothing in
    /// frame is an empty list.
    pub async fn detections_for_image(&self, image_id: Uuid) -> ApiResult<Vec<Detection>> {
        if self.images.get(image_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("image {image_id}")));
        }
        self.detections.list_for_image(image_id).await
    }

    pub async fn list(
        &self,
        page: i64,
        page_size: i64,
        label: Option<String>,
        min_confidence: Option<f64>,
    ) -> ApiResult<PaginatedResponse<Detection>> {
        let (page, page_size) = validate_page_params(page, page_size)?;
        if let Some(min) = min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err(ApiError::Validation(format!(
                    "min_confidence must be between 0 and 1, got {min}"
                )));
            }
        }
        if let Some(label) = &label {
            if label.trim().is_empty() {
                return Err(ApiError::Validation("label filter must not be empty".into()));
            }
        }

        let filter = DetectionFilter {
            label,
            min_confidence,
        };
        let (total, items) = self.detections.list(&filter, page, page_size).await?;
        Ok(PaginatedResponse::new(items, total, page, page_size))
    }
}
