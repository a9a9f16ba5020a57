use crate::types::BoundingBox;

/// Relative geometry of one bounding box over a rendered image, all values
/// percentages of the image's natural dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    /// Inline style fragment for an absolutely positioned overlay element.
    pub fn css(&self) -> String {
        format!(
            "left:{}%;top:{}%;width:{}%;height:{}%",
            self.left, self.top, self.width, self.height
        )
    }
}

/// Project a bbox from original-image pixel space onto percentages of the
/// image's natural dimensions. Returns `None` until the natural dimensions
/// are known (image load not complete) or when the box is degenerate, so a
/// caller can never place a box before the image has real geometry.
pub fn overlay_rect(bbox: &BoundingBox, natural_width: u32, natural_height: u32) -> Option<OverlayRect> {
    if natural_width == 0 || natural_height == 0 || !bbox.is_valid() {
        return None;
    }
    let w = natural_width as f64;
    let h = natural_height as f64;
    Some(OverlayRect {
        left: bbox.xmin as f64 / w * 100.0,
        top: bbox.ymin as f64 / h * 100.0,
        width: bbox.width() as f64 / w * 100.0,
        height: bbox.height() as f64 / h * 100.0,
    })
}
