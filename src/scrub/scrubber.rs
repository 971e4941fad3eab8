//! Scrub entry point.

use bytes::Bytes;
use tracing::debug;

use crate::container::ContainerFormat;
use crate::error::ScrubError;

use super::allow::AllowList;
use super::rebuild::rebuild;

/// Removes every EXIF tag that is not on its allow-list from JPEG and PNG files.
///
/// The allow-list is fixed at construction and the scrubber holds no other
/// state, so a single instance can be shared across request handlers.
#[derive(Debug, Clone, Default)]
pub struct ExifScrubber {
    allow: AllowList,
}

impl ExifScrubber {
    /// Create a scrubber keeping the given tag ids and tag paths.
    pub fn new<I, P, S>(allowed_ids: I, allowed_paths: P) -> Self
    where
        I: IntoIterator<Item = u16>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_allow_list(AllowList::new(allowed_ids, allowed_paths))
    }

    pub fn with_allow_list(allow: AllowList) -> Self {
        Self { allow }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Scrub one file.
    ///
    /// 1. Detect the container (JPEG first, then PNG)
    /// 2. Return the input unchanged if it carries no EXIF block
    /// 3. Otherwise parse, rebuild with only allowed tags, substitute, and write
    ///
    /// # Errors
    /// - `UnsupportedFormat` if the data is neither JPEG nor PNG
    /// - `Parse` if the container or its EXIF block is malformed
    /// - `StructuralInconsistency` if a directory pointer has no unique child
    /// - `Serialize` if the rebuilt block cannot be written back
    pub fn scrub(&self, data: Bytes) -> Result<Bytes, ScrubError> {
        let format = ContainerFormat::detect(&data).ok_or(ScrubError::UnsupportedFormat)?;
        let mut container = format.open(data.clone()).map_err(ScrubError::parse)?;

        let Some(root) = container.root_ifd().map_err(ScrubError::parse)? else {
            debug!(format = format.name(), "No EXIF metadata present");
            return Ok(data);
        };

        let (filtered, stats) = rebuild(&root, &self.allow)?;

        container
            .substitute(&filtered)
            .map_err(ScrubError::serialize)?;
        let output = container.write().map_err(ScrubError::serialize)?;

        debug!(
            format = format.name(),
            kept = stats.kept,
            dropped = stats.dropped,
            directories = stats.directories,
            input_size = data.len(),
            output_size = output.len(),
            "Scrubbed EXIF metadata"
        );

        Ok(output)
    }
}

// =============================================================================
// Tests
// =============================================================================
