//! PNG chunk handling.
//!
//! # PNG Layout
//! ```text
//! 89 50 4E 47 0D 0A 1A 0A                 signature
//! <len:u32 BE> <type:4> <data:len> <crc>  chunk, repeated until IEND
//! ```
//!
//! The CRC covers type and data. EXIF lives in the `eXIf` chunk as a bare
//! TIFF block. Some writers prefix it with `Exif\0\0` like a JPEG APP1
//! segment; that prefix is accepted on read and dropped on write.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::ContainerError;

use super::jpeg::EXIF_HEADER;
use super::{ContainerFormat, MetadataContainer};

// =============================================================================
// Constants
// =============================================================================

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Chunk type carrying EXIF
pub const EXIF_CHUNK: [u8; 4] = *b"eXIf";

/// Final chunk type
pub const IEND_CHUNK: [u8; 4] = *b"IEND";

/// Largest chunk data length allowed by the PNG format
pub const MAX_CHUNK_LENGTH: usize = (1 << 31) - 1;

/// Length + type + CRC
const CHUNK_OVERHEAD: usize = 12;

const FORMAT: &str = "PNG";

/// Check for the 8-byte PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

// =============================================================================
// PngChunk
// =============================================================================

/// A single PNG chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngChunk {
    pub chunk_type: [u8; 4],
    pub data: Bytes,
}

impl PngChunk {
    /// CRC-32 over type and data.
    pub fn crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.chunk_type);
        hasher.update(&self.data);
        hasher.finalize()
    }

    /// Chunk type as text for logs and errors.
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }
}

// =============================================================================
// PngChunks
// =============================================================================

/// A PNG file split into chunks.
#[derive(Debug, Clone)]
pub struct PngChunks {
    chunks: Vec<PngChunk>,
    trailing: Bytes,
    exif_index: Option<usize>,
    exif: Option<Bytes>,
}

impl PngChunks {
    /// Split a PNG file into CRC-verified chunks.
    ///
    /// Parsing stops after IEND; any bytes after it are kept verbatim.
    ///
    /// # Errors
    /// - `MissingSignature` if the data does not start with the PNG signature
    /// - `Truncated` if a chunk extends past the end of the data
    /// - `CrcMismatch` if a chunk's stored CRC is wrong
    pub fn parse(data: Bytes) -> Result<Self, ContainerError> {
        if !is_png(&data) {
            return Err(ContainerError::MissingSignature { format: FORMAT });
        }

        let mut chunks = Vec::new();
        let mut pos = PNG_SIGNATURE.len();

        while pos < data.len() {
            if pos + CHUNK_OVERHEAD > data.len() {
                return Err(ContainerError::Truncated {
                    format: FORMAT,
                    offset: pos,
                });
            }

            let length =
                u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
                    as usize;
            let data_start = pos + 8;
            let data_end = data_start + length;
            if length > MAX_CHUNK_LENGTH || data_end + 4 > data.len() {
                return Err(ContainerError::Truncated {
                    format: FORMAT,
                    offset: pos,
                });
            }

            let chunk = PngChunk {
                chunk_type: [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]],
                data: data.slice(data_start..data_end),
            };

            let stored = u32::from_be_bytes([
                data[data_end],
                data[data_end + 1],
                data[data_end + 2],
                data[data_end + 3],
            ]);
            let computed = chunk.crc();
            if stored != computed {
                return Err(ContainerError::CrcMismatch {
                    chunk: chunk.type_name(),
                    stored,
                    computed,
                });
            }

            pos = data_end + 4;
            let is_end = chunk.chunk_type == IEND_CHUNK;
            chunks.push(chunk);
            if is_end {
                break;
            }
        }

        let trailing = data.slice(pos.min(data.len())..);
        if !trailing.is_empty() {
            warn!(bytes = trailing.len(), "PNG has data after IEND");
        }

        let (exif_index, exif) = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.chunk_type == EXIF_CHUNK)
            .map(|(index, chunk)| (index, strip_exif_header(&chunk.data)))
            .find(|(_, tiff)| !tiff.is_empty())
            .map_or((None, None), |(index, tiff)| (Some(index), Some(tiff)));

        debug!(
            chunks = chunks.len(),
            has_exif = exif_index.is_some(),
            "Parsed PNG chunks"
        );

        Ok(Self {
            chunks,
            trailing,
            exif_index,
            exif,
        })
    }

    /// Chunks in file order.
    pub fn chunks(&self) -> &[PngChunk] {
        &self.chunks
    }
}

fn strip_exif_header(data: &Bytes) -> Bytes {
    if data.starts_with(EXIF_HEADER) {
        data.slice(EXIF_HEADER.len()..)
    } else {
        data.clone()
    }
}

impl MetadataContainer for PngChunks {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Png
    }

    fn exif_payload(&self) -> Option<&Bytes> {
        self.exif.as_ref()
    }

    fn replace_exif_payload(&mut self, payload: Vec<u8>) -> Result<(), ContainerError> {
        let index = self
            .exif_index
            .ok_or(ContainerError::NoExifBlock { format: FORMAT })?;

        if payload.len() > MAX_CHUNK_LENGTH {
            return Err(ContainerError::PayloadTooLarge {
                format: FORMAT,
                size: payload.len(),
                limit: MAX_CHUNK_LENGTH,
            });
        }

        let payload = Bytes::from(payload);
        self.exif = Some(payload.clone()).filter(|tiff| !tiff.is_empty());
        self.chunks[index].data = payload;

        let dropped_before = self.chunks[..index]
            .iter()
            .filter(|chunk| chunk.chunk_type == EXIF_CHUNK)
            .count();
        let mut position = 0;
        self.chunks.retain(|chunk| {
            let keep = position == index || chunk.chunk_type != EXIF_CHUNK;
            position += 1;
            keep
        });
        self.exif_index = Some(index - dropped_before);

        Ok(())
    }

    fn write(&self) -> Result<Bytes, ContainerError> {
        let size = PNG_SIGNATURE.len()
            + self
                .chunks
                .iter()
                .map(|chunk| CHUNK_OVERHEAD + chunk.data.len())
                .sum::<usize>()
            + self.trailing.len();
        let mut out = BytesMut::with_capacity(size);

        out.put_slice(&PNG_SIGNATURE);
        for chunk in &self.chunks {
            if chunk.data.len() > MAX_CHUNK_LENGTH {
                return Err(ContainerError::PayloadTooLarge {
                    format: FORMAT,
                    size: chunk.data.len(),
                    limit: MAX_CHUNK_LENGTH,
                });
            }
            out.put_u32(chunk.data.len() as u32);
            out.put_slice(&chunk.chunk_type);
            out.put_slice(&chunk.data);
            out.put_u32(chunk.crc());
        }
        out.put_slice(&self.trailing);

        Ok(out.freeze())
    }
}

// =============================================================================
// Tests
// =============================================================================
