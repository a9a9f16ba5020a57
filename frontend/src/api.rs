use std::time::Duration;

use gloo_file::File as SelectedFile;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use shared::{Detection, ErrorBody, ImageRecord, PaginatedResponse, RetryPolicy};
use uuid::Uuid;
use web_sys::FormData;

enum FetchError {
    /// Network failures and 5xx answers; worth another attempt.
    Transient(String),
    /// 4xx answers and undecodable bodies; retrying cannot help.
    Final(String),
}

/// Thin client for the backend REST surface. Reads go through a bounded
/// retry loop; uploads, analysis and deletes fail fast and surface the
/// server's error message.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// `base_url` is usually empty (same-origin, served by the backend).
    pub fn new(base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Direct URL of the stored file, for `<img src>`.
    pub fn image_file_url(&self, id: Uuid) -> String {
        self.url(&format!("/images/{id}/file"))
    }

    pub async fn list_images(
        &self,
        page: u32,
        page_size: u32,
        status: Option<&str>,
        filename_substr: Option<&str>,
    ) -> Result<PaginatedResponse<ImageRecord>, String> {
        let mut query = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(needle) = filename_substr {
            query.push(("filename_substr", needle.to_string()));
        }
        self.get_json("/images", &query).await
    }

    pub async fn get_image(&self, id: Uuid) -> Result<ImageRecord, String> {
        self.get_json(&format!("/images/{id}"), &[]).await
    }

    pub async fn image_detections(&self, id: Uuid) -> Result<Vec<Detection>, String> {
        self.get_json(&format!("/images/{id}/detections"), &[]).await
    }

    pub async fn list_detections(
        &self,
        page: u32,
        page_size: u32,
        label: Option<&str>,
        min_confidence: Option<f64>,
    ) -> Result<PaginatedResponse<Detection>, String> {
        let mut query = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(label) = label {
            query.push(("label", label.to_string()));
        }
        if let Some(min) = min_confidence {
            query.push(("min_confidence", min.to_string()));
        }
        self.get_json("/detections", &query).await
    }

    pub async fn upload_image(&self, file: &SelectedFile) -> Result<ImageRecord, String> {
        let form = FormData::new().map_err(|_| "could not build form data".to_string())?;
        form.append_with_blob_and_filename("file", file.as_ref(), &file.name())
            .map_err(|_| "could not attach the selected file".to_string())?;
        let response = Request::post(&self.url("/images/upload"))
            .body(form)
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::accept_json(response).await
    }

    pub async fn analyze_image(&self, id: Uuid) -> Result<Vec<Detection>, String> {
        let response = Request::post(&self.url(&format!("/images/{id}/analyze")))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::accept_json(response).await
    }

    pub async fn delete_image(&self, id: Uuid) -> Result<(), String> {
        let response = Request::delete(&self.url(&format!("/images/{id}")))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.ok() {
            Ok(())
        } else {
            Err(Self::error_message(response).await)
        }
    }

    /// GET and decode, retrying transient failures with the shared
    /// backoff schedule.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, String> {
        let url = self.url(path);
        let mut failures = 0;
        loop {
            match Self::fetch_json(&url, query).await {
                Ok(value) => return Ok(value),
                Err(FetchError::Final(message)) => return Err(message),
                Err(FetchError::Transient(message)) => {
                    failures += 1;
                    let Some(delay_ms) = self.retry.delay_after(failures) else {
                        return Err(message);
                    };
                    log::warn!("GET {url} failed ({message}), retrying in {delay_ms}ms");
                    gloo_timers::future::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = Request::get(url)
            .query(query.iter().map(|(key, value)| (*key, value.as_str())))
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;
        if response.ok() {
            response
                .json::<T>()
                .await
                .map_err(|e| FetchError::Final(format!("undecodable response: {e}")))
        } else if response.status() >= 500 {
            Err(FetchError::Transient(Self::error_message(response).await))
        } else {
            Err(FetchError::Final(Self::error_message(response).await))
        }
    }

    async fn accept_json<T: DeserializeOwned>(response: Response) -> Result<T, String> {
        if response.ok() {
            response
                .json::<T>()
                .await
                .map_err(|e| format!("undecodable response: {e}"))
        } else {
            Err(Self::error_message(response).await)
        }
    }

    /// The server's error payload, or the bare status when the body is
    /// not ours (proxies, hard crashes).
    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("request failed with status {status}"),
        }
    }
}
