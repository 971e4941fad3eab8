//! TIFF header and directory tree parsing for EXIF blocks.
//!
//! An EXIF block is a small TIFF file: an 8-byte header followed by a chain of
//! Image File Directories (IFDs).
//!
//! # TIFF Header Structure
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! # IFD Structure
//! ```text
//! 2 bytes:          entry count N
//! N * 12 bytes:     entries (2 tag + 2 type + 4 count + 4 value/offset)
//! 4 bytes:          offset of next IFD in the chain (0 = end)
//! ```

use std::collections::HashSet;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::ExifError;
use crate::io::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, write_u16_be, write_u16_le,
    write_u32_be, write_u32_le,
};

use super::ifd::{EntryValue, Ifd, IfdIdentity, TagEntry};
use super::tags::{self, FieldType};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Size of the TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count field at the start of an IFD
pub const IFD_COUNT_SIZE: usize = 2;

/// Size of the next-IFD offset at the end of an IFD
pub const IFD_NEXT_OFFSET_SIZE: usize = 4;

/// Longest directory chain accepted; EXIF uses at most IFD0 and IFD1
pub const MAX_CHAIN_LENGTH: usize = 16;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of an EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Write a u16 into a byte slice using this byte order.
    #[inline]
    pub fn write_u16(self, out: &mut [u8], value: u16) {
        match self {
            ByteOrder::LittleEndian => write_u16_le(out, value),
            ByteOrder::BigEndian => write_u16_be(out, value),
        }
    }

    /// Write a u32 into a byte slice using this byte order.
    #[inline]
    pub fn write_u32(self, out: &mut [u8], value: u32) {
        match self {
            ByteOrder::LittleEndian => write_u32_le(out, value),
            ByteOrder::BigEndian => write_u32_be(out, value),
        }
    }

    /// The two magic bytes announcing this byte order.
    #[inline]
    pub const fn magic(self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF header of an EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the block
    pub byte_order: ByteOrder,

    /// Offset to IFD0
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse a TIFF header from the start of an EXIF block.
    ///
    /// `bytes` must be the whole block so the first IFD offset can be checked.
    ///
    /// # Errors
    /// - `TooSmall` if there aren't enough bytes for the header
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42 (BigTIFF is never used for EXIF)
    /// - `InvalidIfdOffset` if the first IFD offset is inside the header or past the end
    pub fn parse(bytes: &[u8]) -> Result<Self, ExifError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(ExifError::TooSmall {
                required: TIFF_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        // Checking for specific byte patterns, so read as little-endian
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(ExifError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        if version != VERSION_TIFF {
            return Err(ExifError::InvalidVersion(version));
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]);
        if (first_ifd_offset as usize) < TIFF_HEADER_SIZE
            || first_ifd_offset as usize >= bytes.len()
        {
            return Err(ExifError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }

    /// Serialize this header.
    pub fn to_bytes(&self) -> [u8; TIFF_HEADER_SIZE] {
        let mut out = [0u8; TIFF_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.byte_order.magic());
        self.byte_order.write_u16(&mut out[2..4], VERSION_TIFF);
        self.byte_order.write_u32(&mut out[4..8], self.first_ifd_offset);
        out
    }
}

// =============================================================================
// Directory Tree Parsing
// =============================================================================

/// Parse a complete EXIF block into its directory tree.
///
/// `data` starts at the TIFF header (the `Exif\0\0` preamble of JPEG APP1
/// segments must already be stripped). Value bytes in the returned tree are
/// zero-copy slices of `data`.
///
/// Entries with unknown field types are skipped. Every IFD offset may be
/// visited at most once; a second visit means the chain or a child pointer
/// loops back and the block is rejected with `IfdRevisited`.
pub fn parse_exif(data: Bytes) -> Result<Ifd, ExifError> {
    let header = TiffHeader::parse(&data)?;

    let mut parser = IfdParser {
        data,
        byte_order: header.byte_order,
        visited: HashSet::new(),
    };

    parser.parse_chain(header.first_ifd_offset, IfdIdentity::root())
}

struct IfdParser {
    data: Bytes,
    byte_order: ByteOrder,
    visited: HashSet<u32>,
}

impl IfdParser {
    /// Parse a chain of directories starting at `offset`.
    fn parse_chain(&mut self, offset: u32, identity: IfdIdentity) -> Result<Ifd, ExifError> {
        let mut ifds = Vec::new();
        let mut offset = offset;
        let mut identity = identity;

        loop {
            let (ifd, next_offset) = self.parse_ifd(offset, identity)?;
            ifds.push(ifd);

            if next_offset == 0 {
                break;
            }
            if ifds.len() >= MAX_CHAIN_LENGTH {
                return Err(ExifError::ChainTooLong(MAX_CHAIN_LENGTH));
            }
            offset = next_offset;
            identity = identity.next_in_chain();
        }

        // Link back to front so each directory owns its successor
        ifds.into_iter()
            .rev()
            .fold(None, |next: Option<Ifd>, mut ifd| {
                ifd.next = next.map(Box::new);
                Some(ifd)
            })
            .ok_or(ExifError::InvalidIfdOffset(offset))
    }

    /// Parse one directory, its children, and return it with its next offset.
    fn parse_ifd(&mut self, offset: u32, identity: IfdIdentity) -> Result<(Ifd, u32), ExifError> {
        let start = offset as usize;
        if start < TIFF_HEADER_SIZE || start + IFD_COUNT_SIZE > self.data.len() {
            return Err(ExifError::InvalidIfdOffset(offset));
        }
        if !self.visited.insert(offset) {
            return Err(ExifError::IfdRevisited(offset));
        }

        let byte_order = self.byte_order;
        let entry_count = byte_order.read_u16(&self.data[start..]);
        let table_start = start + IFD_COUNT_SIZE;
        let table_end = table_start + entry_count as usize * IFD_ENTRY_SIZE;
        if table_end + IFD_NEXT_OFFSET_SIZE > self.data.len() {
            return Err(ExifError::TruncatedIfd {
                offset,
                entries: entry_count,
            });
        }

        let mut ifd = Ifd::new(identity, byte_order, offset);
        let mut pending_children = Vec::new();

        for i in 0..entry_count as usize {
            let entry_start = table_start + i * IFD_ENTRY_SIZE;
            let raw = &self.data[entry_start..entry_start + IFD_ENTRY_SIZE];

            let tag_id = byte_order.read_u16(&raw[0..2]);
            let field_type_raw = byte_order.read_u16(&raw[2..4]);
            let count = byte_order.read_u32(&raw[4..8]);

            let child_path = tags::child_ifd_path(identity.path(), tag_id);
            let field_type = match FieldType::from_u16(field_type_raw) {
                Some(field_type) => field_type,
                None if child_path.is_some()
                    && field_type_raw == FieldType::IFD_POINTER_CODE =>
                {
                    FieldType::Long
                }
                None => {
                    warn!(
                        ifd = %identity,
                        tag_id,
                        field_type = field_type_raw,
                        "Skipping tag with unknown field type"
                    );
                    continue;
                }
            };

            let value = match child_path {
                Some(child_path) => {
                    let child_identity = IfdIdentity::child(child_path, tag_id);
                    let child_offset = byte_order.read_u32(&raw[8..12]);
                    pending_children.push((ifd.entries.len(), child_offset, child_identity));
                    EntryValue::ChildIfd(child_identity)
                }
                None => EntryValue::Bytes(self.read_value(
                    tag_id,
                    field_type,
                    count,
                    entry_start + 8,
                )?),
            };

            ifd.entries.push(TagEntry {
                tag_id,
                field_type,
                count,
                ifd_path: identity.path(),
                value,
            });
        }

        let next_offset = byte_order.read_u32(&self.data[table_end..]);

        for (entry_index, child_offset, child_identity) in pending_children {
            let mut child = self.parse_chain(child_offset, child_identity)?;
            child.parent_entry_index = Some(entry_index);
            ifd.children.push(child);
        }

        debug!(
            ifd = %identity,
            offset,
            entries = ifd.entries.len(),
            children = ifd.children.len(),
            "Parsed IFD"
        );

        Ok((ifd, next_offset))
    }

    /// Read the raw bytes of a value, inline or at its offset.
    fn read_value(
        &self,
        tag_id: u16,
        field_type: FieldType,
        count: u32,
        value_field: usize,
    ) -> Result<Bytes, ExifError> {
        let size = field_type.size_in_bytes() as u64 * count as u64;

        if field_type.fits_inline(count) {
            let start = value_field;
            return Ok(self.data.slice(start..start + size as usize));
        }

        let offset = self.byte_order.read_u32(&self.data[value_field..]);
        let end = offset as u64 + size;
        if end > self.data.len() as u64 {
            return Err(ExifError::ValueOutOfBounds {
                tag: tag_id,
                offset,
                size,
            });
        }

        Ok(self.data.slice(offset as usize..end as usize))
    }
}

// =============================================================================
// Tests
// =============================================================================
