//! Test utilities for integration tests.
//!
//! Real pixel data comes from the `image` crate; EXIF blocks are built with
//! [`IfdBuilder`] and spliced into the encoded files by hand, the way a camera
//! or editing tool would place them.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use jaf::exif::tags;
use jaf::{ByteOrder, ContainerFormat, FieldType, IfdBuilder, IfdIdentity};

// =============================================================================
// Image Generation
// =============================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

/// Create a baseline JPEG with no EXIF.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 85);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Create a PNG with no EXIF.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Check that the data still decodes as an image.
pub fn decodes(data: &[u8]) -> bool {
    image::load_from_memory(data).is_ok()
}

// =============================================================================
// EXIF Splicing
// =============================================================================

/// Insert an `Exif\0\0` APP1 segment right after SOI.
pub fn insert_jpeg_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let payload_len = 6 + tiff.len();

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Encode one PNG chunk with its CRC.
pub fn png_chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);

    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

/// Insert an `eXIf` chunk right after IHDR.
pub fn insert_png_exif(png: &[u8], tiff: &[u8]) -> Vec<u8> {
    // Signature (8) + IHDR (4 length + 4 type + 13 data + 4 CRC)
    let ihdr_end = 8 + 25;
    assert_eq!(&png[12..16], b"IHDR");

    let mut out = png[..ihdr_end].to_vec();
    out.extend_from_slice(&png_chunk(b"eXIf", tiff));
    out.extend_from_slice(&png[ihdr_end..]);
    out
}

// =============================================================================
// EXIF Blocks
// =============================================================================

fn short(bo: ByteOrder, value: u16) -> Vec<u8> {
    let mut out = vec![0; 2];
    bo.write_u16(&mut out, value);
    out
}

fn long(bo: ByteOrder, value: u32) -> Vec<u8> {
    let mut out = vec![0; 4];
    bo.write_u32(&mut out, value);
    out
}

fn rationals(bo: ByteOrder, values: &[(u32, u32)]) -> Vec<u8> {
    let mut out = vec![0; values.len() * 8];
    for (i, (num, den)) in values.iter().enumerate() {
        bo.write_u32(&mut out[i * 8..], *num);
        bo.write_u32(&mut out[i * 8 + 4..], *den);
    }
    out
}

/// A camera-style EXIF tree:
///
/// ```text
/// IFD0  Make, Model, Orientation, ->Exif, ->GPSInfo
///   Exif     ExposureTime, DateTimeOriginal, Flash, ->Iop
///     Iop    InteroperabilityIndex
///   GPSInfo  GPSLatitudeRef, GPSLatitude, GPSTimeStamp, GPSDateStamp
/// IFD1  Compression, thumbnail offset/length
/// ```
pub fn camera_exif_tree(bo: ByteOrder) -> IfdBuilder {
    let mut iop = IfdBuilder::new(
        IfdIdentity::child(tags::IFD_PATH_INTEROP, tags::TAG_INTEROP_IFD_POINTER),
        bo,
    );
    iop.add_value(0x0001, FieldType::Ascii, &b"R98\0"[..]);

    let mut exif = IfdBuilder::new(
        IfdIdentity::child(tags::IFD_PATH_EXIF, tags::TAG_EXIF_IFD_POINTER),
        bo,
    );
    exif.add_value(0x829a, FieldType::Rational, rationals(bo, &[(1, 250)]));
    exif.add_value(0x9003, FieldType::Ascii, &b"2024:05:01 12:34:56\0"[..]);
    exif.add_value(0x9209, FieldType::Short, short(bo, 0x0010));
    exif.add_child(tags::TAG_INTEROP_IFD_POINTER, iop);

    let mut gps = IfdBuilder::new(
        IfdIdentity::child(tags::IFD_PATH_GPS, tags::TAG_GPS_IFD_POINTER),
        bo,
    );
    gps.add_value(0x0001, FieldType::Ascii, &b"N\0"[..]);
    gps.add_value(
        0x0002,
        FieldType::Rational,
        rationals(bo, &[(52, 1), (31, 1), (1234, 100)]),
    );
    gps.add_value(
        0x0007,
        FieldType::Rational,
        rationals(bo, &[(12, 1), (34, 1), (56, 1)]),
    );
    gps.add_value(0x001d, FieldType::Ascii, &b"2024:05:01\0"[..]);

    let mut ifd1 = IfdBuilder::new(IfdIdentity::root().next_in_chain(), bo);
    ifd1.add_value(0x0103, FieldType::Short, short(bo, 6));
    // Offset/length of a thumbnail; the image bytes themselves do not matter here
    ifd1.add_value(tags::TAG_THUMBNAIL_OFFSET, FieldType::Long, long(bo, 8));
    ifd1.add_value(tags::TAG_THUMBNAIL_LENGTH, FieldType::Long, long(bo, 4));

    let mut root = IfdBuilder::new(IfdIdentity::root(), bo);
    root.add_value(0x010f, FieldType::Ascii, &b"Canon\0"[..]);
    root.add_value(0x0110, FieldType::Ascii, &b"EOS 5D\0"[..]);
    root.add_value(0x0112, FieldType::Short, short(bo, 6));
    root.add_child(tags::TAG_EXIF_IFD_POINTER, exif);
    root.add_child(tags::TAG_GPS_IFD_POINTER, gps);
    root.set_next(ifd1);
    root
}

/// Encoded [`camera_exif_tree`].
pub fn camera_exif(bo: ByteOrder) -> Vec<u8> {
    camera_exif_tree(bo).encode().unwrap()
}

/// Every value tag of [`camera_exif_tree`] except the thumbnail markers.
pub const CAMERA_TAG_PATHS: &[&str] = &[
    "IFD/Make",
    "IFD/Model",
    "IFD/Orientation",
    "IFD/Exif/ExposureTime",
    "IFD/Exif/DateTimeOriginal",
    "IFD/Exif/Flash",
    "IFD/Exif/Iop/InteroperabilityIndex",
    "IFD/GPSInfo/GPSLatitudeRef",
    "IFD/GPSInfo/GPSLatitude",
    "IFD/GPSInfo/GPSTimeStamp",
    "IFD/GPSInfo/GPSDateStamp",
    "IFD/Compression",
];

/// Every tag id of [`camera_exif_tree`] except the thumbnail markers.
pub const CAMERA_TAG_IDS: &[u16] = &[
    0x010f, 0x0110, 0x0112, 0x829a, 0x9003, 0x9209, 0x0001, 0x0002, 0x0007, 0x001d, 0x0103,
];

/// A JPEG carrying [`camera_exif`].
pub fn camera_jpeg(bo: ByteOrder) -> Bytes {
    Bytes::from(insert_jpeg_exif(&create_test_jpeg(32, 24), &camera_exif(bo)))
}

/// A PNG carrying [`camera_exif`].
pub fn camera_png(bo: ByteOrder) -> Bytes {
    Bytes::from(insert_png_exif(&create_test_png(32, 24), &camera_exif(bo)))
}

// =============================================================================
// Inspection
// =============================================================================

/// Paths of all value tags in an image, or `None` if it has no EXIF.
pub fn exif_tag_paths(data: &[u8]) -> Option<Vec<String>> {
    let data = Bytes::copy_from_slice(data);
    let container = ContainerFormat::detect(&data)?.open(data).unwrap();
    container.root_ifd().unwrap().map(|root| root.tag_paths())
}

/// `(path, raw value)` of all value tags in an image's EXIF.
pub fn exif_values(data: &[u8]) -> Vec<(String, Bytes)> {
    let data = Bytes::copy_from_slice(data);
    let container = ContainerFormat::detect(&data).unwrap().open(data).unwrap();
    let root = container.root_ifd().unwrap().unwrap();

    let mut values = Vec::new();
    root.visit_tags(&mut |_, entry| {
        if let Some(raw) = entry.raw_bytes() {
            values.push((entry.path(), raw.clone()));
        }
    });
    values
}
