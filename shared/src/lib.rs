pub mod flow;
pub mod overlay;
pub mod pagination;
pub mod retry;
pub mod types;

pub use flow::{FlowEvent, UploadFlow};
pub use overlay::{overlay_rect, OverlayRect};
pub use pagination::{PaginatedResponse, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use retry::RetryPolicy;
pub use types::{BoundingBox, Detection, ErrorBody, ImageRecord, ImageStatus};
