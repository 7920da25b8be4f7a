//! Server errors and their HTTP rendering.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dfab_blob::BlobError;
use dfab_service::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while configuring or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("metadata store error: {0}")]
    Metadata(#[from] dfab_meta::MetaError),

    #[error("converter error: {0}")]
    Conversion(#[from] dfab_convert::ConversionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling.
    pub code: String,
    /// Human-readable explanation.
    pub detail: String,
}

/// Error type for request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// Malformed input, rejected before reaching the service.
    #[error("{0}")]
    Validation(String),

    #[error("request body exceeds the upload limit: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    /// Classify a multipart read failure by the status axum assigns to it.
    pub fn from_multipart(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::Validation(e.body_text())
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Service(e) => match e {
                ServiceError::NotFound(_) => "not_found",
                ServiceError::Conversion(_) => "conversion_failed",
                ServiceError::Blob(BlobError::InvalidFilename(_)) => "validation_error",
                ServiceError::Blob(_) => "storage_error",
                ServiceError::Metadata(_) => "metadata_error",
                ServiceError::Task(_) => "internal_error",
            },
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Service(e) => match e {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Blob(BlobError::InvalidFilename(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
