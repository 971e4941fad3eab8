//! Container adapter tests on encoder-produced files.
//!
//! Tests verify:
//! - Detection order and signatures
//! - EXIF lookup in JPEG APP1 segments and PNG eXIf chunks
//! - Duplicate EXIF blocks collapse to one on substitution
//! - Framing errors surface as container errors

use bytes::Bytes;

use jaf::container::png::PngChunks;
use jaf::exif::IfdIdentity;
use jaf::{
    ByteOrder, ContainerError, ContainerFormat, ExifScrubber, IfdBuilder, JpegSegments,
    MetadataContainer,
};

use super::test_utils::{
    camera_exif, camera_jpeg, camera_png, create_test_jpeg, create_test_png, decodes,
    exif_tag_paths, insert_jpeg_exif, insert_png_exif, png_chunk,
};

// =============================================================================
// Detection
// =============================================================================

#[test]
fn test_detect_encoded_images() {
    assert_eq!(
        ContainerFormat::detect(&create_test_jpeg(8, 8)),
        Some(ContainerFormat::Jpeg)
    );
    assert_eq!(
        ContainerFormat::detect(&create_test_png(8, 8)),
        Some(ContainerFormat::Png)
    );
    assert_eq!(ContainerFormat::detect(b"II*\0\x08\0\0\0"), None);
}

#[test]
fn test_open_reports_format() {
    let jpeg = ContainerFormat::Jpeg.open(camera_jpeg(ByteOrder::LittleEndian)).unwrap();
    assert_eq!(jpeg.format(), ContainerFormat::Jpeg);

    let png = ContainerFormat::Png.open(camera_png(ByteOrder::LittleEndian)).unwrap();
    assert_eq!(png.format(), ContainerFormat::Png);
}

// =============================================================================
// JPEG
// =============================================================================

#[test]
fn test_jpeg_without_exif_has_no_payload() {
    let segments = JpegSegments::parse(Bytes::from(create_test_jpeg(8, 8))).unwrap();
    assert!(segments.exif_payload().is_none());
    assert!(segments.root_ifd().unwrap().is_none());
}

#[test]
fn test_jpeg_write_is_lossless() {
    let input = camera_jpeg(ByteOrder::BigEndian);
    let segments = JpegSegments::parse(input.clone()).unwrap();
    assert_eq!(segments.exif_payload().unwrap().as_ref(), &camera_exif(ByteOrder::BigEndian)[..]);
    assert_eq!(segments.write().unwrap(), input);
}

#[test]
fn test_jpeg_duplicate_exif_collapses() {
    let jpeg = create_test_jpeg(8, 8);
    let once = insert_jpeg_exif(&jpeg, &camera_exif(ByteOrder::LittleEndian));
    let twice = insert_jpeg_exif(&once, &camera_exif(ByteOrder::BigEndian));

    let output = ExifScrubber::default().scrub(Bytes::from(twice)).unwrap();
    let segments = JpegSegments::parse(output.clone()).unwrap();
    assert_eq!(segments.segments().iter().filter(|s| s.is_exif()).count(), 1);

    // The first block is the one that was rebuilt
    let root = segments.root_ifd().unwrap().unwrap();
    assert_eq!(root.byte_order, ByteOrder::BigEndian);
    assert!(decodes(&output));
}

#[test]
fn test_jpeg_payload_limit() {
    let mut segments = JpegSegments::parse(camera_jpeg(ByteOrder::LittleEndian)).unwrap();
    let result = segments.replace_exif_payload(vec![0; 70_000]);
    assert!(matches!(result, Err(ContainerError::PayloadTooLarge { .. })));
}

#[test]
fn test_jpeg_truncated_segment() {
    let data = camera_jpeg(ByteOrder::LittleEndian);
    let truncated = data.slice(..40);
    assert!(matches!(
        JpegSegments::parse(truncated),
        Err(ContainerError::Truncated { .. })
    ));
}

// =============================================================================
// PNG
// =============================================================================

#[test]
fn test_png_write_is_lossless() {
    let input = camera_png(ByteOrder::LittleEndian);
    let chunks = PngChunks::parse(input.clone()).unwrap();
    assert_eq!(chunks.write().unwrap(), input);
}

#[test]
fn test_png_exif_header_prefix_tolerated() {
    let mut prefixed = b"Exif\0\0".to_vec();
    prefixed.extend_from_slice(&camera_exif(ByteOrder::LittleEndian));
    let png = insert_png_exif(&create_test_png(8, 8), &prefixed);

    let paths = exif_tag_paths(&png).unwrap();
    assert_eq!(paths[0], "IFD/Make");
}

#[test]
fn test_png_substitute_recomputes_crc() {
    let mut chunks = PngChunks::parse(camera_png(ByteOrder::LittleEndian)).unwrap();
    let empty = IfdBuilder::new(IfdIdentity::root(), ByteOrder::LittleEndian);
    chunks.substitute(&empty).unwrap();

    let output = chunks.write().unwrap();
    // Parsing verifies every CRC
    let reparsed = PngChunks::parse(output.clone()).unwrap();
    assert!(reparsed.root_ifd().unwrap().unwrap().entries.is_empty());
    assert!(decodes(&output));
}

#[test]
fn test_png_crc_mismatch() {
    let mut data = camera_png(ByteOrder::LittleEndian).to_vec();
    // Last byte of the IHDR CRC
    data[32] ^= 0xFF;
    assert!(matches!(
        PngChunks::parse(Bytes::from(data)),
        Err(ContainerError::CrcMismatch { ref chunk, .. }) if chunk == "IHDR"
    ));
}

#[test]
fn test_png_trailing_data_survives() {
    let mut data = camera_png(ByteOrder::BigEndian).to_vec();
    data.extend_from_slice(b"trailer");

    let output = ExifScrubber::default().scrub(Bytes::from(data)).unwrap();
    assert!(output.ends_with(b"trailer"));
}

#[test]
fn test_png_duplicate_exif_collapses() {
    let png = create_test_png(8, 8);
    let first = insert_png_exif(&png, &camera_exif(ByteOrder::LittleEndian));
    // Second eXIf right before IEND
    let iend = first.len() - 12;
    let mut data = first[..iend].to_vec();
    data.extend_from_slice(&png_chunk(b"eXIf", &camera_exif(ByteOrder::BigEndian)));
    data.extend_from_slice(&first[iend..]);

    let output = ExifScrubber::default().scrub(Bytes::from(data)).unwrap();
    let chunks = PngChunks::parse(output).unwrap();
    assert_eq!(
        chunks
            .chunks()
            .iter()
            .filter(|c| &c.chunk_type == b"eXIf")
            .count(),
        1
    );
}
