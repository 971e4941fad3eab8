//! EXIF metadata model, parser and encoder.
//!
//! An EXIF block is a TIFF-structured blob embedded in a JPEG APP1 segment or
//! a PNG `eXIf` chunk.
//!
//! # Key Concepts
//!
//! - **Directory chain**: IFD0 links to IFD1 (the thumbnail directory) through
//!   its next-IFD offset. Both share the path `IFD`; IFD1 prints as `IFD1`.
//!
//! - **Child directories**: pointer tags open nested chains: `IFD/Exif`
//!   (0x8769), `IFD/GPSInfo` (0x8825) and `IFD/Exif/Iop` (0xA005).
//!
//! - **Tag paths**: a tag is addressed as `"<directory path>/<tag name>"`, e.g.
//!   `"IFD/GPSInfo/GPSTimeStamp"`. Unknown tags use their hex id as name.
//!
//! - **Read vs write**: [`parse_exif`] produces a read-only [`Ifd`] tree;
//!   [`IfdBuilder`] is its writable counterpart and knows how to encode itself.

mod builder;
mod ifd;
mod parser;
pub mod tags;

pub use builder::{BuilderTag, BuilderValue, IfdBuilder};
pub use ifd::{EntryValue, Ifd, IfdIdentity, TagEntry};
pub use parser::{parse_exif, ByteOrder, TiffHeader, IFD_ENTRY_SIZE, TIFF_HEADER_SIZE};
pub use tags::FieldType;
