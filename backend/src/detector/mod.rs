//! Object-detection pipeline seam. The service talks to `ObjectDetector`
//! only, so tests inject a stub and production wires up [`HttpDetector`].

mod http;

pub use http::HttpDetector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::BoundingBox;

use crate::error::ApiResult;

/// One candidate as the pipeline reports it, before screening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub score: f64,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Runs inference on one encoded image and returns every candidate the
    /// pipeline produced. Screening (threshold, box sanity) is the caller's
    /// job.
    async fn detect(&self, image_bytes: &[u8], media_type: &str) -> ApiResult<Vec<RawDetection>>;

    /// Cheap liveness probe for the readiness endpoint.
    async fn healthy(&self) -> ApiResult<()>;
}
