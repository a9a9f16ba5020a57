mod fixtures;
pub use fixtures::*;

// Re-export commonly used types so test files import from one place.
pub use backend::db::{DetectionRepository, ImageRepository};
pub use backend::detector::{ObjectDetector, RawDetection};
pub use backend::error::ApiError;
pub use backend::services::{DetectionService, ImageService};
pub use shared::{BoundingBox, ImageStatus};
