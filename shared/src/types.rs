use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle of an uploaded image. Upload creates `Pending`; the analysis
/// flow moves it through `Processing` to `Completed` or `Failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImageStatus {
    pub const ALL: [ImageStatus; 4] = [
        ImageStatus::Pending,
        ImageStatus::Processing,
        ImageStatus::Completed,
        ImageStatus::Failed,
    ];
}

/// Metadata for one uploaded file; the pixel data lives in blob storage at
/// `storage_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub file_size: i64,
    pub status: ImageStatus,
    pub upload_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One labeled, scored, bounding-boxed object instance found in an image.
/// Created in bulk by analysis, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: Uuid,
    pub image_id: Uuid,
    pub label: String,
    pub confidence_score: f64,
    pub bbox_xmin: i64,
    pub bbox_ymin: i64,
    pub bbox_xmax: i64,
    pub bbox_ymax: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Detection {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            xmin: self.bbox_xmin,
            ymin: self.bbox_ymin,
            xmax: self.bbox_xmax,
            ymax: self.bbox_ymax,
        }
    }
}

/// Axis-aligned box in original-image pixel coordinates, `(xmin, ymin)`
/// top-left, `(xmax, ymax)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BoundingBox {
    /// A box is valid when both edges have positive extent and it does not
    /// reach into negative coordinate space.
    pub fn is_valid(&self) -> bool {
        self.xmin >= 0 && self.ymin >= 0 && self.xmax > self.xmin && self.ymax > self.ymin
    }

    pub fn width(&self) -> i64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i64 {
        self.ymax - self.ymin
    }
}

/// Error payload returned by every failing API call: a stable
/// machine-readable kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in ImageStatus::ALL {
            let parsed: ImageStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("uploading".parse::<ImageStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ImageStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ImageStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn detection_wire_format_uses_flattened_bbox_fields() {
        let detection = Detection {
            id: Uuid::nil(),
            image_id: Uuid::nil(),
            label: "cat".into(),
            confidence_score: 0.95,
            bbox_xmin: 10,
            bbox_ymin: 10,
            bbox_xmax: 50,
            bbox_ymax: 50,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["label"], "cat");
        assert_eq!(value["confidence_score"], 0.95);
        assert_eq!(value["bbox_xmin"], 10);
        assert_eq!(value["bbox_ymax"], 50);
    }

    #[test]
    fn bbox_rejects_degenerate_boxes() {
        let valid = BoundingBox {
            xmin: 10,
            ymin: 10,
            xmax: 50,
            ymax: 50,
        };
        assert!(valid.is_valid());
        assert_eq!(valid.width(), 40);
        assert_eq!(valid.height(), 40);

        assert!(
            !BoundingBox {
                xmin: 50,
                ymin: 10,
                xmax: 50,
                ymax: 60,
            }
            .is_valid()
        );
        assert!(
            !BoundingBox {
                xmin: 10,
                ymin: 60,
                xmax: 50,
                ymax: 40,
            }
            .is_valid()
        );
        assert!(
            !BoundingBox {
                xmin: -1,
                ymin: 0,
                xmax: 10,
                ymax: 10,
            }
            .is_valid()
        );
    }
}
