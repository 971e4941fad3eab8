//! # jaf
//!
//! Just another file host: an HTTP upload service that stores files under
//! short random names and strips EXIF metadata from JPEG and PNG images
//! before they touch the disk.
//!
//! ## Features
//!
//! - **Selective EXIF scrubbing**: every tag is dropped unless its id or its
//!   path (e.g. `IFD/GPSInfo/GPSDateStamp`) is allow-listed; directory
//!   structure and byte order survive so the image stays parseable
//! - **Native container handling**: JPEG APP1 segments and PNG `eXIf` chunks,
//!   pixel data passed through byte for byte
//! - **Collision-free names**: random names reserved in a shared registry and
//!   created exclusively on disk
//!
//! ## Architecture
//!
//! - [`io`] - Endian helpers
//! - [`exif`] - EXIF/TIFF directory model, parser and encoder
//! - [`container`] - JPEG/PNG adapters locating and replacing EXIF blocks
//! - [`scrub`] - Allow-list, directory rebuild and the scrubber entry point
//! - [`upload`] - Naming, extension detection, scrub policy and storage
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI, environment and config-file settings
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use jaf::ExifScrubber;
//!
//! let scrubber = ExifScrubber::new([0x0112], ["IFD/GPSInfo/GPSDateStamp"]);
//!
//! // Neither JPEG nor PNG: left to the caller
//! let result = scrubber.scrub(Bytes::from_static(b"plain text"));
//! assert!(result.is_err());
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod exif;
pub mod io;
pub mod scrub;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use container::{ContainerFormat, JpegSegments, MetadataContainer, PngChunks};
pub use error::{
    ConfigError, ContainerError, ExifError, MetadataError, ScrubError, UploadError,
};
pub use exif::{parse_exif, ByteOrder, FieldType, Ifd, IfdBuilder, IfdIdentity, TagEntry};
pub use scrub::{rebuild, AllowList, ExifScrubber, RebuildStats};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use upload::{FileNameRegistry, StoredUpload, UploadService, UploadSettings};
