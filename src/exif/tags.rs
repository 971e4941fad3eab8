//! EXIF field type and tag definitions.
//!
//! This module defines the vocabulary for EXIF parsing, including:
//! - Field types that determine how values are encoded
//! - The standard directory paths and the pointer tags linking them
//! - Tag names used to build `"<directory-path>/<tag-name>"` paths
//!
//! Tag names follow the naming of the EXIF 2.3 and TIFF 6.0 standards.

// =============================================================================
// Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a fixed unit size in bytes. A value's total size
/// (`count * unit size`) decides whether it is stored inline in the IFD entry
/// or at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,

    /// 8-bit ASCII character, NUL terminated
    Ascii = 2,

    /// Unsigned 16-bit integer
    Short = 3,

    /// Unsigned 32-bit integer
    Long = 4,

    /// Two LONGs: numerator and denominator
    Rational = 5,

    /// Signed 8-bit integer
    SByte = 6,

    /// Opaque byte
    Undefined = 7,

    /// Signed 16-bit integer
    SShort = 8,

    /// Signed 32-bit integer
    SLong = 9,

    /// Two SLONGs: numerator and denominator
    SRational = 10,

    /// IEEE single precision float
    Float = 11,

    /// IEEE double precision float
    Double = 12,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            _ => None,
        }
    }

    /// Get the numeric type code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Maximum bytes that can be stored inline in an IFD entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Type code 13 (IFD) from TIFF-EP, a LONG offset used by some writers
    /// for directory pointers.
    pub const IFD_POINTER_CODE: u16 = 13;

    /// Check if a value with this type and count fits inline.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        self.size_in_bytes() as u64 * count as u64 <= Self::INLINE_THRESHOLD as u64
    }
}

// =============================================================================
// Directory Paths
// =============================================================================

/// Path of the root directory chain (IFD0, IFD1, ...).
pub const IFD_PATH_ROOT: &str = "IFD";

/// Path of the EXIF sub-IFD.
pub const IFD_PATH_EXIF: &str = "IFD/Exif";

/// Path of the GPS IFD.
pub const IFD_PATH_GPS: &str = "IFD/GPSInfo";

/// Path of the Interoperability IFD.
pub const IFD_PATH_INTEROP: &str = "IFD/Exif/Iop";

/// Pointer from IFD0 to the EXIF sub-IFD.
pub const TAG_EXIF_IFD_POINTER: u16 = 0x8769;

/// Pointer from IFD0 to the GPS IFD.
pub const TAG_GPS_IFD_POINTER: u16 = 0x8825;

/// Pointer from the EXIF sub-IFD to the Interoperability IFD.
pub const TAG_INTEROP_IFD_POINTER: u16 = 0xA005;

/// Offset of the embedded JPEG thumbnail (IFD1).
pub const TAG_THUMBNAIL_OFFSET: u16 = 0x0201;

/// Byte length of the embedded JPEG thumbnail (IFD1).
pub const TAG_THUMBNAIL_LENGTH: u16 = 0x0202;

/// Standard parent/child directory relations.
///
/// `(parent path, pointer tag, child path, child name)`
const CHILD_IFDS: &[(&str, u16, &str, &str)] = &[
    (IFD_PATH_ROOT, TAG_EXIF_IFD_POINTER, IFD_PATH_EXIF, "Exif"),
    (IFD_PATH_ROOT, TAG_GPS_IFD_POINTER, IFD_PATH_GPS, "GPSInfo"),
    (IFD_PATH_EXIF, TAG_INTEROP_IFD_POINTER, IFD_PATH_INTEROP, "Iop"),
];

/// Look up the child directory a pointer tag leads to.
///
/// Returns `None` when `tag_id` is not a directory pointer inside
/// `parent_path`; the same id in another directory is an ordinary value.
pub fn child_ifd_path(parent_path: &str, tag_id: u16) -> Option<&'static str> {
    CHILD_IFDS
        .iter()
        .find(|(parent, tag, _, _)| *parent == parent_path && *tag == tag_id)
        .map(|(_, _, child, _)| *child)
}

/// Check whether a tag is one of the thumbnail markers, which scrubbing always drops.
///
/// Thumbnail markers only live in the root chain.
#[inline]
pub fn is_thumbnail_marker(ifd_path: &str, tag_id: u16) -> bool {
    ifd_path == IFD_PATH_ROOT && (tag_id == TAG_THUMBNAIL_OFFSET || tag_id == TAG_THUMBNAIL_LENGTH)
}

// =============================================================================
// Tag Names
// =============================================================================

/// Tags of IFD0 / IFD1 (TIFF baseline plus common extensions).
const ROOT_TAGS: &[(u16, &str)] = &[
    (0x00fe, "NewSubfileType"),
    (0x0100, "ImageWidth"),
    (0x0101, "ImageLength"),
    (0x0102, "BitsPerSample"),
    (0x0103, "Compression"),
    (0x0106, "PhotometricInterpretation"),
    (0x010e, "ImageDescription"),
    (0x010f, "Make"),
    (0x0110, "Model"),
    (0x0111, "StripOffsets"),
    (0x0112, "Orientation"),
    (0x0115, "SamplesPerPixel"),
    (0x0116, "RowsPerStrip"),
    (0x0117, "StripByteCounts"),
    (0x011a, "XResolution"),
    (0x011b, "YResolution"),
    (0x011c, "PlanarConfiguration"),
    (0x0128, "ResolutionUnit"),
    (0x012d, "TransferFunction"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013b, "Artist"),
    (0x013e, "WhitePoint"),
    (0x013f, "PrimaryChromaticities"),
    (0x0201, "JPEGInterchangeFormat"),
    (0x0202, "JPEGInterchangeFormatLength"),
    (0x0211, "YCbCrCoefficients"),
    (0x0212, "YCbCrSubSampling"),
    (0x0213, "YCbCrPositioning"),
    (0x0214, "ReferenceBlackWhite"),
    (0x02bc, "XMLPacket"),
    (0x4746, "Rating"),
    (0x4749, "RatingPercent"),
    (0x8298, "Copyright"),
    (0x83bb, "IPTCNAA"),
    (0x8769, "ExifTag"),
    (0x8773, "InterColorProfile"),
    (0x8825, "GPSTag"),
    (0x9c9b, "XPTitle"),
    (0x9c9c, "XPComment"),
    (0x9c9d, "XPAuthor"),
    (0x9c9e, "XPKeywords"),
    (0x9c9f, "XPSubject"),
    (0xc4a5, "PrintImageMatching"),
];

/// Tags of the EXIF sub-IFD.
const EXIF_TAGS: &[(u16, &str)] = &[
    (0x829a, "ExposureTime"),
    (0x829d, "FNumber"),
    (0x8822, "ExposureProgram"),
    (0x8824, "SpectralSensitivity"),
    (0x8827, "ISOSpeedRatings"),
    (0x8828, "OECF"),
    (0x8830, "SensitivityType"),
    (0x8831, "StandardOutputSensitivity"),
    (0x8832, "RecommendedExposureIndex"),
    (0x8833, "ISOSpeed"),
    (0x9000, "ExifVersion"),
    (0x9003, "DateTimeOriginal"),
    (0x9004, "DateTimeDigitized"),
    (0x9010, "OffsetTime"),
    (0x9011, "OffsetTimeOriginal"),
    (0x9012, "OffsetTimeDigitized"),
    (0x9101, "ComponentsConfiguration"),
    (0x9102, "CompressedBitsPerPixel"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9203, "BrightnessValue"),
    (0x9204, "ExposureBiasValue"),
    (0x9205, "MaxApertureValue"),
    (0x9206, "SubjectDistance"),
    (0x9207, "MeteringMode"),
    (0x9208, "LightSource"),
    (0x9209, "Flash"),
    (0x920a, "FocalLength"),
    (0x9214, "SubjectArea"),
    (0x927c, "MakerNote"),
    (0x9286, "UserComment"),
    (0x9290, "SubSecTime"),
    (0x9291, "SubSecTimeOriginal"),
    (0x9292, "SubSecTimeDigitized"),
    (0xa000, "FlashpixVersion"),
    (0xa001, "ColorSpace"),
    (0xa002, "PixelXDimension"),
    (0xa003, "PixelYDimension"),
    (0xa004, "RelatedSoundFile"),
    (0xa005, "InteroperabilityTag"),
    (0xa20b, "FlashEnergy"),
    (0xa20c, "SpatialFrequencyResponse"),
    (0xa20e, "FocalPlaneXResolution"),
    (0xa20f, "FocalPlaneYResolution"),
    (0xa210, "FocalPlaneResolutionUnit"),
    (0xa214, "SubjectLocation"),
    (0xa215, "ExposureIndex"),
    (0xa217, "SensingMethod"),
    (0xa300, "FileSource"),
    (0xa301, "SceneType"),
    (0xa302, "CFAPattern"),
    (0xa401, "CustomRendered"),
    (0xa402, "ExposureMode"),
    (0xa403, "WhiteBalance"),
    (0xa404, "DigitalZoomRatio"),
    (0xa405, "FocalLengthIn35mmFilm"),
    (0xa406, "SceneCaptureType"),
    (0xa407, "GainControl"),
    (0xa408, "Contrast"),
    (0xa409, "Saturation"),
    (0xa40a, "Sharpness"),
    (0xa40b, "DeviceSettingDescription"),
    (0xa40c, "SubjectDistanceRange"),
    (0xa420, "ImageUniqueID"),
    (0xa430, "CameraOwnerName"),
    (0xa431, "BodySerialNumber"),
    (0xa432, "LensSpecification"),
    (0xa433, "LensMake"),
    (0xa434, "LensModel"),
    (0xa435, "LensSerialNumber"),
    (0xa500, "Gamma"),
];

/// Tags of the GPS IFD.
const GPS_TAGS: &[(u16, &str)] = &[
    (0x0000, "GPSVersionID"),
    (0x0001, "GPSLatitudeRef"),
    (0x0002, "GPSLatitude"),
    (0x0003, "GPSLongitudeRef"),
    (0x0004, "GPSLongitude"),
    (0x0005, "GPSAltitudeRef"),
    (0x0006, "GPSAltitude"),
    (0x0007, "GPSTimeStamp"),
    (0x0008, "GPSSatellites"),
    (0x0009, "GPSStatus"),
    (0x000a, "GPSMeasureMode"),
    (0x000b, "GPSDOP"),
    (0x000c, "GPSSpeedRef"),
    (0x000d, "GPSSpeed"),
    (0x000e, "GPSTrackRef"),
    (0x000f, "GPSTrack"),
    (0x0010, "GPSImgDirectionRef"),
    (0x0011, "GPSImgDirection"),
    (0x0012, "GPSMapDatum"),
    (0x0013, "GPSDestLatitudeRef"),
    (0x0014, "GPSDestLatitude"),
    (0x0015, "GPSDestLongitudeRef"),
    (0x0016, "GPSDestLongitude"),
    (0x0017, "GPSDestBearingRef"),
    (0x0018, "GPSDestBearing"),
    (0x0019, "GPSDestDistanceRef"),
    (0x001a, "GPSDestDistance"),
    (0x001b, "GPSProcessingMethod"),
    (0x001c, "GPSAreaInformation"),
    (0x001d, "GPSDateStamp"),
    (0x001e, "GPSDifferential"),
    (0x001f, "GPSHPositioningError"),
];

/// Tags of the Interoperability IFD.
const INTEROP_TAGS: &[(u16, &str)] = &[
    (0x0001, "InteroperabilityIndex"),
    (0x0002, "InteroperabilityVersion"),
    (0x1000, "RelatedImageFileFormat"),
    (0x1001, "RelatedImageWidth"),
    (0x1002, "RelatedImageLength"),
];

fn tag_table(ifd_path: &str) -> &'static [(u16, &'static str)] {
    match ifd_path {
        IFD_PATH_ROOT => ROOT_TAGS,
        IFD_PATH_EXIF => EXIF_TAGS,
        IFD_PATH_GPS => GPS_TAGS,
        IFD_PATH_INTEROP => INTEROP_TAGS,
        _ => &[],
    }
}

/// Look up the standard name of a tag within a directory.
///
/// Returns `None` for tags not defined for that directory.
pub fn tag_name(ifd_path: &str, tag_id: u16) -> Option<&'static str> {
    tag_table(ifd_path)
        .iter()
        .find(|(id, _)| *id == tag_id)
        .map(|(_, name)| *name)
}

/// Build the fully qualified `"<directory-path>/<tag-name>"` path of a tag.
///
/// Unknown tags are named by their id, e.g. `"IFD/0xabcd"`.
pub fn tag_path(ifd_path: &str, tag_id: u16) -> String {
    match tag_name(ifd_path, tag_id) {
        Some(name) => format!("{}/{}", ifd_path, name),
        None => format!("{}/0x{:04x}", ifd_path, tag_id),
    }
}

// =============================================================================
// Tests
// =============================================================================
