//! HTTP server layer for jaf.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 HTTP Layer                   │
//! │        POST /upload      GET /health         │
//! │                                              │
//! │  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │    handlers      │  │      routes      │  │
//! │  │ (multipart, JSON │  │ (body limit,     │  │
//! │  │  error mapping)  │  │  timeout, trace) │  │
//! │  └──────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//!               upload::UploadService
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, upload_handler, AppState, ErrorResponse, HealthResponse, UPLOAD_FIELD,
};
pub use routes::{
    create_router, RouterConfig, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
};
