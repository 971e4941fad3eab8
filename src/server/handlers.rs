//! HTTP request handlers for the jaf upload API.
//!
//! # Endpoints
//!
//! - `POST /upload` - Store a file and return its link
//! - `GET /health` - Health check endpoint

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::UploadError;
use crate::upload::UploadService;

/// Multipart form field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub upload: UploadService,
}

impl AppState {
    pub fn new(upload: UploadService) -> Self {
        Self { upload }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_request", "scrub_failed")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert UploadError to HTTP response.
///
/// 5xx errors are logged at ERROR level, 413 at DEBUG, other 4xx at WARN.
impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            UploadError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            UploadError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "too_large"),
            UploadError::Scrub(_) => (StatusCode::UNPROCESSABLE_ENTITY, "scrub_failed"),
            UploadError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            UploadError::NoFreeName { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "no_free_name"),
            UploadError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "task_failed"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::PAYLOAD_TOO_LARGE {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Upload rejected: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge(err.body_text())
    } else {
        UploadError::InvalidRequest(err.body_text())
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle file uploads.
///
/// # Endpoint
///
/// `POST /upload` with a `multipart/form-data` body containing a `file` field.
///
/// # Response
///
/// - `200 OK`: `text/plain` body with the link to the stored file
/// - `400 Bad Request`: No `file` field, or the form could not be read
/// - `413 Payload Too Large`: Body exceeds `max_upload_size`
/// - `422 Unprocessable Entity`: EXIF could not be scrubbed and
///   `exif_abort_on_error` is set
/// - `500 Internal Server Error`: The file could not be stored
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring form field");
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        let stored = state.upload.store(&original_name, data).await?;

        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            stored.link,
        )
            .into_response());
    }

    Err(UploadError::InvalidRequest(format!(
        "missing form field \"{}\"",
        UPLOAD_FIELD
    )))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
