use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{ObjectDetector, RawDetection};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the external detection service. The image travels base64-coded
/// in a JSON body; the response carries the raw candidate list.
pub struct HttpDetector {
    base_url: String,
    model: String,
    threshold: f64,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    model: &'a str,
    image: String,
    media_type: &'a str,
    threshold: f64,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<RawDetection>,
}

impl HttpDetector {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.detector_url.trim_end_matches('/').to_string(),
            model: config.detector_model.clone(),
            threshold: config.confidence_threshold,
            timeout: Duration::from_secs(config.detector_timeout_secs),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    async fn detect(&self, image_bytes: &[u8], media_type: &str) -> ApiResult<Vec<RawDetection>> {
        let request = DetectRequest {
            model: &self.model,
            image: STANDARD.encode(image_bytes),
            media_type,
            threshold: self.threshold,
        };

        let response = self
            .client
            .post(format!("{}/api/detect", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("detection request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "detection service returned {status}: {body}"
            )));
        }

        let parsed: DetectResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("invalid detection response: {e}")))?;
        Ok(parsed.detections)
    }

    async fn healthy(&self) -> ApiResult<()> {
        let response = self
            .client
            .get(&self.base_url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("detection service unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "detection service returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: "test.db".into(),
            upload_dir: "uploads".into(),
            max_upload_size: 1024,
            confidence_threshold: 0.5,
            detector_url: "http://localhost:11434/".into(),
            detector_model: "yolos-tiny".into(),
            detector_timeout_secs: 30,
            frontend_dist: "dist".into(),
        }
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let detector = HttpDetector::new(&test_config());
        assert_eq!(detector.base_url, "http://localhost:11434");
        assert_eq!(detector.timeout, Duration::from_secs(30));
    }

    #[test]
    fn request_body_has_the_wire_fields() {
        let request = DetectRequest {
            model: "yolos-tiny",
            image: STANDARD.encode(b"fake"),
            media_type: "image/png",
            threshold: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "yolos-tiny");
        assert_eq!(json["media_type"], "image/png");
        assert_eq!(json["threshold"], 0.5);
        assert_eq!(json["image"], STANDARD.encode(b"fake"));
    }

    #[test]
    fn response_parses_box_into_bbox() {
        let body = r#"{"detections":[
            {"label":"cat","score":0.95,"box":{"xmin":10,"ymin":10,"xmax":50,"ymax":50}},
            {"label":"dog","score":0.42,"box":{"xmin":0,"ymin":0,"xmax":5,"ymax":5}}
        ]}"#;
        let parsed: DetectResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.detections.len(), 2);
        assert_eq!(parsed.detections[0].label, "cat");
        assert_eq!(parsed.detections[0].bbox.xmax, 50);
    }
}
