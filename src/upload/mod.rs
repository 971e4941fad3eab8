//! File upload handling.
//!
//! This module turns an uploaded file into a stored file plus a public link:
//!
//! - [`extension`] - picks the stored file's extension
//! - [`names`] - random file names and the registry of taken names
//! - [`service`] - scrub policy, exclusive file creation, link building

pub mod extension;
pub mod names;
pub mod service;

pub use extension::{build_file_extension, sniff_extension};
pub use names::{random_stem, FileNameRegistry, NAME_ALPHABET};
pub use service::{StoredUpload, UploadService, UploadSettings, MAX_NAME_ATTEMPTS};
