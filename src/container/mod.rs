//! Image containers that carry EXIF blocks.
//!
//! A container adapter knows the byte-level framing of one image format and
//! nothing about EXIF semantics: it locates the embedded EXIF payload, swaps
//! it for a new one and writes the file back out. Everything else in the file
//! (pixel data, other metadata segments/chunks) passes through untouched.
//!
//! # Format Detection
//!
//! Use [`ContainerFormat::detect`] on the raw upload. Detection is by magic
//! bytes only and checks JPEG before PNG:
//!
//! - **JPEG**: `FF D8 FF`
//! - **PNG**: `89 50 4E 47 0D 0A 1A 0A`

pub mod jpeg;
pub mod png;

use bytes::Bytes;

use crate::error::{ContainerError, ExifError, MetadataError};
use crate::exif::{parse_exif, Ifd, IfdBuilder};

pub use jpeg::{JpegSegment, JpegSegments};
pub use png::{PngChunk, PngChunks};

// =============================================================================
// ContainerFormat
// =============================================================================

/// Image formats the scrubber understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Jpeg,
    Png,
}

impl ContainerFormat {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            ContainerFormat::Jpeg => "JPEG",
            ContainerFormat::Png => "PNG",
        }
    }

    /// Identify the container format from leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if jpeg::is_jpeg(data) {
            Some(ContainerFormat::Jpeg)
        } else if png::is_png(data) {
            Some(ContainerFormat::Png)
        } else {
            None
        }
    }

    /// Parse `data` as this format.
    pub fn open(self, data: Bytes) -> Result<Box<dyn MetadataContainer>, ContainerError> {
        Ok(match self {
            ContainerFormat::Jpeg => Box::new(JpegSegments::parse(data)?),
            ContainerFormat::Png => Box::new(PngChunks::parse(data)?),
        })
    }
}

// =============================================================================
// MetadataContainer
// =============================================================================

/// A parsed image file whose EXIF block can be read and replaced.
pub trait MetadataContainer: Send {
    /// Format of this container.
    fn format(&self) -> ContainerFormat;

    /// Raw EXIF payload, starting at the TIFF header.
    ///
    /// `None` means the file carries no EXIF metadata at all.
    fn exif_payload(&self) -> Option<&Bytes>;

    /// Replace the existing EXIF payload with `payload` (a TIFF block).
    ///
    /// # Errors
    /// - `NoExifBlock` if there is no payload to replace
    /// - `PayloadTooLarge` if the payload does not fit the container's framing
    fn replace_exif_payload(&mut self, payload: Vec<u8>) -> Result<(), ContainerError>;

    /// Serialize the container back to bytes.
    fn write(&self) -> Result<Bytes, ContainerError>;

    /// Parse the EXIF payload into its directory tree.
    fn root_ifd(&self) -> Result<Option<Ifd>, ExifError> {
        self.exif_payload()
            .map(|payload| parse_exif(payload.clone()))
            .transpose()
    }

    /// Encode `builder` and install it as the new EXIF payload.
    fn substitute(&mut self, builder: &IfdBuilder) -> Result<(), MetadataError> {
        let payload = builder.encode()?;
        self.replace_exif_payload(payload)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
