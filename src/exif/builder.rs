//! Construction and serialization of EXIF directory trees.
//!
//! [`IfdBuilder`] is the writable mirror of [`Ifd`](super::Ifd): each entry is
//! either raw value bytes or a nested builder, never both. The encoder lays a
//! builder tree out as a TIFF block:
//!
//! ```text
//! header | IFD table | out-of-line values | children... | next IFD...
//! ```
//!
//! Every directory and out-of-line value starts on a word (2-byte) boundary.

use bytes::Bytes;
use tracing::trace;

use crate::error::ExifError;

use super::ifd::IfdIdentity;
use super::parser::{
    ByteOrder, TiffHeader, IFD_COUNT_SIZE, IFD_ENTRY_SIZE, IFD_NEXT_OFFSET_SIZE, TIFF_HEADER_SIZE,
};
use super::tags::{self, FieldType};

// =============================================================================
// Builder Types
// =============================================================================

/// Value of a builder entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderValue {
    /// Raw value bytes in the builder's byte order
    Bytes(Bytes),

    /// Nested directory chain reached through this entry
    Child(Box<IfdBuilder>),
}

/// One entry of an [`IfdBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderTag {
    pub tag_id: u16,
    pub field_type: FieldType,
    pub value: BuilderValue,
}

/// Writable directory: ordered entries and an optional chain successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdBuilder {
    identity: IfdIdentity,
    byte_order: ByteOrder,
    entries: Vec<BuilderTag>,
    next: Option<Box<IfdBuilder>>,
}

impl IfdBuilder {
    /// Create an empty builder.
    pub fn new(identity: IfdIdentity, byte_order: ByteOrder) -> Self {
        Self {
            identity,
            byte_order,
            entries: Vec::new(),
            next: None,
        }
    }

    /// Append a value entry. `value` must already be in this builder's byte order.
    pub fn add_value(&mut self, tag_id: u16, field_type: FieldType, value: impl Into<Bytes>) {
        self.entries.push(BuilderTag {
            tag_id,
            field_type,
            value: BuilderValue::Bytes(value.into()),
        });
    }

    /// Append a directory pointer entry owning `child`.
    pub fn add_child(&mut self, tag_id: u16, child: IfdBuilder) {
        self.entries.push(BuilderTag {
            tag_id,
            field_type: FieldType::Long,
            value: BuilderValue::Child(Box::new(child)),
        });
    }

    /// Set the next directory in this chain.
    pub fn set_next(&mut self, next: IfdBuilder) {
        self.next = Some(Box::new(next));
    }

    pub fn identity(&self) -> IfdIdentity {
        self.identity
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn entries(&self) -> &[BuilderTag] {
        &self.entries
    }

    pub fn next(&self) -> Option<&IfdBuilder> {
        self.next.as_deref()
    }

    /// Paths of all value entries in this chain and its children, in order.
    pub fn tag_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut current = Some(self);
        while let Some(builder) = current {
            for entry in &builder.entries {
                match &entry.value {
                    BuilderValue::Bytes(_) => {
                        paths.push(tags::tag_path(builder.identity.path(), entry.tag_id))
                    }
                    BuilderValue::Child(child) => paths.extend(child.tag_paths()),
                }
            }
            current = builder.next();
        }
        paths
    }

    /// Serialize this tree as a complete TIFF block in this builder's byte order.
    ///
    /// # Errors
    /// - `InvalidValueLength` if a value is not a whole number of its type's units
    /// - `EncodedTooLarge` if an offset would not fit in 32 bits
    pub fn encode(&self) -> Result<Vec<u8>, ExifError> {
        let mut encoder = Encoder {
            byte_order: self.byte_order,
            out: vec![0u8; TIFF_HEADER_SIZE],
        };

        let first_ifd_offset = encoder.encode_ifd(self)?;
        let header = TiffHeader {
            byte_order: self.byte_order,
            first_ifd_offset,
        };
        encoder.out[..TIFF_HEADER_SIZE].copy_from_slice(&header.to_bytes());

        trace!(
            ifd = %self.identity,
            size = encoder.out.len(),
            "Encoded EXIF block"
        );

        Ok(encoder.out)
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// An entry as laid out in a table, before offsets are patched in.
enum Slot<'a> {
    Value(&'a Bytes),
    Child(&'a IfdBuilder),
}

struct Encoder {
    byte_order: ByteOrder,
    out: Vec<u8>,
}

impl Encoder {
    /// Current write position as a TIFF offset.
    fn position(&self) -> Result<u32, ExifError> {
        u32::try_from(self.out.len()).map_err(|_| ExifError::EncodedTooLarge(self.out.len()))
    }

    fn align(&mut self) {
        if self.out.len() % 2 != 0 {
            self.out.push(0);
        }
    }

    /// Append one directory with everything it owns; returns its offset.
    fn encode_ifd(&mut self, builder: &IfdBuilder) -> Result<u32, ExifError> {
        let bo = self.byte_order;

        let mut slots: Vec<(u16, FieldType, u32, Slot<'_>)> =
            Vec::with_capacity(builder.entries.len());
        for entry in &builder.entries {
            match &entry.value {
                BuilderValue::Bytes(bytes) => {
                    let unit = entry.field_type.size_in_bytes();
                    if bytes.len() % unit != 0 {
                        return Err(ExifError::InvalidValueLength {
                            tag: entry.tag_id,
                            len: bytes.len(),
                            unit,
                        });
                    }
                    let count = u32::try_from(bytes.len() / unit)
                        .map_err(|_| ExifError::EncodedTooLarge(bytes.len()))?;
                    slots.push((entry.tag_id, entry.field_type, count, Slot::Value(bytes)));
                }
                BuilderValue::Child(child) => {
                    slots.push((entry.tag_id, FieldType::Long, 1, Slot::Child(child)));
                }
            }
        }

        // Table
        self.align();
        let ifd_offset = self.position()?;
        let table_start = self.out.len();
        let entry_count = u16::try_from(slots.len())
            .map_err(|_| ExifError::EncodedTooLarge(slots.len()))?;
        let table_len = IFD_COUNT_SIZE + slots.len() * IFD_ENTRY_SIZE + IFD_NEXT_OFFSET_SIZE;
        self.out.resize(table_start + table_len, 0);
        bo.write_u16(&mut self.out[table_start..], entry_count);

        let field_pos = |index: usize| table_start + IFD_COUNT_SIZE + index * IFD_ENTRY_SIZE;
        for (index, (tag_id, field_type, count, _)) in slots.iter().enumerate() {
            let pos = field_pos(index);
            bo.write_u16(&mut self.out[pos..], *tag_id);
            bo.write_u16(&mut self.out[pos + 2..], field_type.as_u16());
            bo.write_u32(&mut self.out[pos + 4..], *count);
        }
        let next_pos = field_pos(slots.len());

        // Values, inline or out of line
        for (index, (_, _, _, slot)) in slots.iter().enumerate() {
            let value_pos = field_pos(index) + 8;
            match slot {
                Slot::Value(bytes) if bytes.len() <= FieldType::INLINE_THRESHOLD => {
                    self.out[value_pos..value_pos + bytes.len()].copy_from_slice(bytes);
                }
                Slot::Value(bytes) => {
                    self.align();
                    let offset = self.position()?;
                    self.out.extend_from_slice(bytes);
                    bo.write_u32(&mut self.out[value_pos..], offset);
                }
                Slot::Child(_) => {}
            }
        }

        // Children
        for (index, (_, _, _, slot)) in slots.iter().enumerate() {
            if let Slot::Child(child) = slot {
                let child_offset = self.encode_ifd(child)?;
                bo.write_u32(&mut self.out[field_pos(index) + 8..], child_offset);
            }
        }

        // Chain
        if let Some(next) = &builder.next {
            let next_offset = self.encode_ifd(next)?;
            bo.write_u32(&mut self.out[next_pos..], next_offset);
        }

        Ok(ifd_offset)
    }
}

// =============================================================================
// Tests
// =============================================================================
