use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorBody;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure surfaced by the service. Each variant maps to one HTTP
/// status and one stable machine-readable kind; handlers return
/// `ApiResult<HttpResponse>` and let `ResponseError` do the mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("file exceeds the maximum upload size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("detection pipeline failure: {0}")]
    Upstream(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failure: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::UnsupportedMediaType(_) => "unsupported_media_type",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Storage(_) => "storage_error",
            ApiError::Database(_) | ApiError::Migration(_) | ApiError::Corrupt(_) => {
                "database_error"
            }
        }
    }

    /// Message sent to the client. Store internals stay in the server log.
    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Migration(_) | ApiError::Corrupt(_) => {
                "internal database error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}: {}", self.kind(), self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind().to_string(),
            message: self.public_message(),
        })
    }
}
