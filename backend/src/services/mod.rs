//! Application services sitting between the HTTP layer and the
//! repositories/storage. Routes stay thin; everything testable lives here.

mod detection_service;
mod image_service;

pub use detection_service::DetectionService;
pub use image_service::ImageService;

use shared::MAX_PAGE_SIZE;

use crate::error::{ApiError, ApiResult};

/// Screens raw pagination parameters before they reach SQL. Values come in
/// as `i64` so that negatives and oversized numbers fail here with a clear
/// message instead of being truncated by a cast.
pub(crate) fn validate_page_params(page: i64, page_size: i64) -> ApiResult<(u32, u32)> {
    if page < 1 {
        return Err(ApiError::Validation(format!(
            "page must be at least 1, got {page}"
        )));
    }
    if page_size < 1 || page_size > i64::from(MAX_PAGE_SIZE) {
        return Err(ApiError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    let page = u32::try_from(page)
        .map_err(|_| ApiError::Validation(format!("page {page} is out of range")))?;
    Ok((page, page_size as u32))
}
