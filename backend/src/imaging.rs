use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::{ApiError, ApiResult};

pub const MIN_DIMENSION: u32 = 32;
pub const MAX_DIMENSION: u32 = 8192;

/// Stored bytes normalized for the detection pipeline: RGB8, PNG-encoded.
#[derive(Debug)]
pub struct PreparedImage {
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes and screens an uploaded image before inference. Anything the
/// pipeline should never see (undecodable, degenerate or absurd dimensions)
/// is a validation error.
pub fn prepare_for_detection(bytes: &[u8]) -> ApiResult<PreparedImage> {
    if bytes.is_empty() {
        return Err(ApiError::Validation("image data is empty".into()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ApiError::Validation(format!("could not decode image: {e}")))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(ApiError::Validation(format!(
            "image {width}x{height} is below the {MIN_DIMENSION}x{MIN_DIMENSION} minimum"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ApiError::Validation(format!(
            "image {width}x{height} exceeds the {MAX_DIMENSION}x{MAX_DIMENSION} maximum"
        )));
    }

    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut png_bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| ApiError::Storage(format!("could not re-encode image: {e}")))?;

    Ok(PreparedImage {
        png_bytes,
        width,
        height,
    })
}
