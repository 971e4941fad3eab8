//! JPEG segment handling.
//!
//! A JPEG file is a sequence of marker segments:
//!
//! ```text
//! FF D8                                  SOI
//! FF En <len:u16 BE> <len-2 bytes>       APPn (APP1 = EXIF / XMP)
//! FF xx <len:u16 BE> <len-2 bytes>       DQT, DHT, SOF, ...
//! FF DA ...                              SOS, entropy-coded data, ..., FF D9 EOI
//! ```
//!
//! Only the header segments up to SOS are split out. Scan data cannot be
//! walked with segment lengths, so everything from SOS on is kept as one
//! opaque tail and written back byte for byte.
//!
//! EXIF lives in the first APP1 segment whose payload starts with `Exif\0\0`.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::ContainerError;

use super::{ContainerFormat, MetadataContainer};

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

/// Application segment 1 (EXIF, XMP) marker
pub const APP1: [u8; 2] = [0xFF, 0xE1];

/// Temporary marker, has no length field
const TEM: u8 = 0x01;

/// Identifier that prefixes the TIFF block inside an EXIF APP1 segment
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload a segment can hold (the length field counts itself)
pub const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

const FORMAT: &str = "JPEG";

/// Check for the JPEG signature: SOI followed by the first marker byte.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0..2] == SOI && data[2] == 0xFF
}

/// Markers that stand alone without a length field.
fn is_standalone(marker: u8) -> bool {
    marker == TEM || (0xD0..=0xD7).contains(&marker)
}

// =============================================================================
// JpegSegment
// =============================================================================

/// A header segment before the first scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegSegment {
    /// Second marker byte (e.g. 0xE1 for APP1)
    pub marker: u8,

    /// Segment payload without marker and length; `None` for standalone markers
    pub payload: Option<Bytes>,
}

impl JpegSegment {
    /// Check whether this is an APP1 segment carrying EXIF.
    pub fn is_exif(&self) -> bool {
        self.marker == APP1[1]
            && self
                .payload
                .as_ref()
                .is_some_and(|payload| payload.starts_with(EXIF_HEADER))
    }
}

// =============================================================================
// JpegSegments
// =============================================================================

/// A JPEG file split into header segments and the opaque scan tail.
#[derive(Debug, Clone)]
pub struct JpegSegments {
    segments: Vec<JpegSegment>,
    tail: Bytes,
    exif_index: Option<usize>,
    exif: Option<Bytes>,
}

impl JpegSegments {
    /// Split a JPEG file into segments.
    ///
    /// # Errors
    /// - `MissingSignature` if the data does not start with SOI
    /// - `InvalidMarker` if a segment does not start with 0xFF
    /// - `InvalidSegmentLength` if a length field is smaller than 2
    /// - `Truncated` if the data ends before SOS/EOI or inside a segment
    pub fn parse(data: Bytes) -> Result<Self, ContainerError> {
        if !is_jpeg(&data) {
            return Err(ContainerError::MissingSignature { format: FORMAT });
        }

        let mut segments = Vec::new();
        let mut pos = SOI.len();

        let tail = loop {
            match data.get(pos) {
                Some(0xFF) => {}
                Some(&byte) => return Err(ContainerError::InvalidMarker { byte, offset: pos }),
                None => {
                    return Err(ContainerError::Truncated {
                        format: FORMAT,
                        offset: pos,
                    })
                }
            }

            // Any number of 0xFF fill bytes may precede a marker
            let mut marker_pos = pos + 1;
            while data.get(marker_pos) == Some(&0xFF) {
                marker_pos += 1;
            }
            let marker = *data.get(marker_pos).ok_or(ContainerError::Truncated {
                format: FORMAT,
                offset: marker_pos,
            })?;

            if marker == SOS[1] || marker == EOI[1] {
                break data.slice(marker_pos - 1..);
            }

            if is_standalone(marker) {
                segments.push(JpegSegment {
                    marker,
                    payload: None,
                });
                pos = marker_pos + 1;
                continue;
            }

            let length_pos = marker_pos + 1;
            if length_pos + 2 > data.len() {
                return Err(ContainerError::Truncated {
                    format: FORMAT,
                    offset: length_pos,
                });
            }
            let length = u16::from_be_bytes([data[length_pos], data[length_pos + 1]]);
            if length < 2 {
                return Err(ContainerError::InvalidSegmentLength {
                    length,
                    offset: length_pos,
                });
            }
            let end = length_pos + length as usize;
            if end > data.len() {
                return Err(ContainerError::Truncated {
                    format: FORMAT,
                    offset: data.len(),
                });
            }

            segments.push(JpegSegment {
                marker,
                payload: Some(data.slice(length_pos + 2..end)),
            });
            pos = end;
        };

        // Empty EXIF segments carry no tags; the first populated one is the
        // block that gets parsed and replaced
        let (exif_index, exif) = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_exif())
            .filter_map(|(index, segment)| {
                let tiff = segment.payload.as_ref()?.slice(EXIF_HEADER.len()..);
                (!tiff.is_empty()).then_some((index, tiff))
            })
            .next()
            .map_or((None, None), |(index, tiff)| (Some(index), Some(tiff)));

        debug!(
            segments = segments.len(),
            has_exif = exif_index.is_some(),
            tail = tail.len(),
            "Parsed JPEG segments"
        );

        Ok(Self {
            segments,
            tail,
            exif_index,
            exif,
        })
    }

    /// Header segments in file order.
    pub fn segments(&self) -> &[JpegSegment] {
        &self.segments
    }

    /// Bytes from SOS (or EOI) to the end of the file.
    pub fn tail(&self) -> &Bytes {
        &self.tail
    }
}

impl MetadataContainer for JpegSegments {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Jpeg
    }

    fn exif_payload(&self) -> Option<&Bytes> {
        self.exif.as_ref()
    }

    fn replace_exif_payload(&mut self, payload: Vec<u8>) -> Result<(), ContainerError> {
        let index = self
            .exif_index
            .ok_or(ContainerError::NoExifBlock { format: FORMAT })?;

        let size = EXIF_HEADER.len() + payload.len();
        if size > MAX_SEGMENT_PAYLOAD {
            return Err(ContainerError::PayloadTooLarge {
                format: FORMAT,
                size,
                limit: MAX_SEGMENT_PAYLOAD,
            });
        }

        let mut segment_payload = BytesMut::with_capacity(size);
        segment_payload.put_slice(EXIF_HEADER);
        segment_payload.put_slice(&payload);
        let segment_payload = segment_payload.freeze();
        self.exif =
            Some(segment_payload.slice(EXIF_HEADER.len()..)).filter(|tiff| !tiff.is_empty());
        self.segments[index].payload = Some(segment_payload);

        // Only one EXIF block may survive
        let dropped_before = self.segments[..index]
            .iter()
            .filter(|segment| segment.is_exif())
            .count();
        let mut position = 0;
        self.segments.retain(|segment| {
            let keep = position == index || !segment.is_exif();
            position += 1;
            keep
        });
        self.exif_index = Some(index - dropped_before);

        Ok(())
    }

    fn write(&self) -> Result<Bytes, ContainerError> {
        let size = SOI.len()
            + self
                .segments
                .iter()
                .map(|segment| 4 + segment.payload.as_ref().map_or(0, Bytes::len))
                .sum::<usize>()
            + self.tail.len();
        let mut out = BytesMut::with_capacity(size);

        out.put_slice(&SOI);
        for segment in &self.segments {
            out.put_u8(0xFF);
            out.put_u8(segment.marker);
            if let Some(payload) = &segment.payload {
                if payload.len() > MAX_SEGMENT_PAYLOAD {
                    return Err(ContainerError::PayloadTooLarge {
                        format: FORMAT,
                        size: payload.len(),
                        limit: MAX_SEGMENT_PAYLOAD,
                    });
                }
                out.put_u16(payload.len() as u16 + 2);
                out.put_slice(payload);
            }
        }
        out.put_slice(&self.tail);

        Ok(out.freeze())
    }
}

// =============================================================================
// Tests
// =============================================================================
