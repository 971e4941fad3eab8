//! Upload service: scrub, name, store, link.
//!
//! # Architecture
//!
//! ```text
//! store(name, bytes)
//!   1. extension  <- build_file_extension(bytes, name)
//!   2. bytes      <- ExifScrubber (blocking thread), per scrub policy
//!   3. file name  <- random stem + extension, reserved in FileNameRegistry
//!   4. file       <- created with create_new in file_dir
//!   5. link       <- link_prefix + file name
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{ScrubError, UploadError};
use crate::scrub::ExifScrubber;

use super::extension::build_file_extension;
use super::names::{random_stem, FileNameRegistry};

/// How many random names are tried before giving up.
pub const MAX_NAME_ATTEMPTS: usize = 1000;

// =============================================================================
// Settings
// =============================================================================

/// Configuration of the upload service.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Directory uploads are written to
    pub file_dir: PathBuf,

    /// Prefix prepended to the file name to form the returned link
    pub link_prefix: String,

    /// Number of random characters in a file name (before the extension)
    pub link_length: usize,

    /// Scrub EXIF metadata from JPEG and PNG uploads
    pub scrub_exif: bool,

    /// Reject uploads whose EXIF cannot be scrubbed instead of storing them as is
    pub exif_abort_on_error: bool,
}

/// Result of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Name of the file inside `file_dir`
    pub file_name: String,

    /// Public link to the file
    pub link: String,

    /// Number of bytes written
    pub size: usize,

    /// Whether the stored bytes went through the scrubber
    pub scrubbed: bool,
}

// =============================================================================
// UploadService
// =============================================================================

/// Stores uploaded files under fresh random names.
///
/// Cheap to share: the scrubber and registry are behind `Arc`s.
#[derive(Debug, Clone)]
pub struct UploadService {
    settings: Arc<UploadSettings>,
    scrubber: Arc<ExifScrubber>,
    registry: Arc<FileNameRegistry>,
}

impl UploadService {
    pub fn new(settings: UploadSettings, scrubber: ExifScrubber, registry: FileNameRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            scrubber: Arc::new(scrubber),
            registry: Arc::new(registry),
        }
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn registry(&self) -> &FileNameRegistry {
        &self.registry
    }

    /// Store one uploaded file and return where it can be found.
    ///
    /// `original_name` is the client-supplied file name; only its extension
    /// is used.
    ///
    /// # Errors
    /// - `Scrub` if scrubbing failed and `exif_abort_on_error` is set
    /// - `Storage` if the file could not be written
    /// - `NoFreeName` if no unused name could be generated
    pub async fn store(&self, original_name: &str, data: Bytes) -> Result<StoredUpload, UploadError> {
        let extension = build_file_extension(&data, original_name);
        let (data, scrubbed) = self.apply_scrub_policy(data).await?;
        let file_name = self.write_new_file(&extension, &data).await?;
        let link = format!("{}{}", self.settings.link_prefix, file_name);

        info!(
            file_name = %file_name,
            size = data.len(),
            scrubbed,
            "Stored upload"
        );

        Ok(StoredUpload {
            file_name,
            link,
            size: data.len(),
            scrubbed,
        })
    }

    /// Run the scrubber if enabled and decide what to store.
    async fn apply_scrub_policy(&self, data: Bytes) -> Result<(Bytes, bool), UploadError> {
        if !self.settings.scrub_exif {
            return Ok((data, false));
        }

        let scrubber = Arc::clone(&self.scrubber);
        let input = data.clone();
        let result = tokio::task::spawn_blocking(move || scrubber.scrub(input))
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?;

        match result {
            Ok(scrubbed) => Ok((scrubbed, true)),
            Err(ScrubError::UnsupportedFormat) => {
                debug!("Not an image with EXIF support, storing as is");
                Ok((data, false))
            }
            Err(err) if self.settings.exif_abort_on_error => {
                warn!(error = %err, "Could not scrub EXIF data, rejecting upload");
                Err(UploadError::Scrub(err))
            }
            Err(err) => {
                warn!(error = %err, "Could not scrub EXIF data, storing original file");
                Ok((data, false))
            }
        }
    }

    /// Pick an unused name, create the file exclusively and write `data`.
    async fn write_new_file(&self, extension: &str, data: &[u8]) -> Result<String, UploadError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = format!("{}{}", random_stem(self.settings.link_length), extension);
            if !self.registry.reserve(&file_name) {
                continue;
            }

            let path = self.settings.file_dir.join(&file_name);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    // Created behind our back; keep it reserved
                    debug!(file_name = %file_name, "File name already exists on disk");
                    continue;
                }
                Err(e) => {
                    self.registry.release(&file_name);
                    return Err(e.into());
                }
            };

            let written = match file.write_all(data).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };

            if let Err(e) = written {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %remove_err, "Could not remove partial upload");
                }
                self.registry.release(&file_name);
                return Err(e.into());
            }

            return Ok(file_name);
        }

        Err(UploadError::NoFreeName {
            attempts: MAX_NAME_ATTEMPTS,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
