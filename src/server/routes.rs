//! Router configuration for jaf.
//!
//! # Route Structure
//!
//! ```text
//! /upload    POST   - Store a file, respond with its link
//! /health    GET    - Health check
//! ```
//!
//! # Example
//!
//! ```ignore
//! use jaf::server::{create_router, RouterConfig};
//!
//! let router = create_router(upload_service, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:4711").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, upload_handler, AppState};
use crate::upload::UploadService;

/// Default upload size limit (100 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Largest accepted request body in bytes
    pub max_upload_size: usize,

    /// Time after which a request is aborted
    pub request_timeout: Duration,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Both routes share a body limit and a request timeout; tracing is added on
/// top when enabled.
pub fn create_router(upload: UploadService, config: RouterConfig) -> Router {
    let router = Router::new()
        .route("/upload", post(upload_handler))
        .route("/health", get(health_handler))
        .with_state(AppState::new(upload))
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(TimeoutLayer::new(config.request_timeout));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
