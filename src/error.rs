use thiserror::Error;

/// Errors that can occur when parsing or encoding an EXIF (TIFF-structured) block
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExifError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// Block is too small to contain a valid TIFF header
    #[error("EXIF block too small: need at least {required} bytes, got {actual}")]
    TooSmall { required: usize, actual: usize },

    /// IFD offset points outside the block or into the header
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u32),

    /// The same IFD offset was reached twice while walking the directory graph
    #[error("IFD at offset {0} is referenced more than once")]
    IfdRevisited(u32),

    /// A directory chain is longer than any real EXIF block needs
    #[error("IFD chain longer than {0} directories")]
    ChainTooLong(usize),

    /// IFD table extends past the end of the block
    #[error("Truncated IFD at offset {offset}: {entries} entries do not fit")]
    TruncatedIfd { offset: u32, entries: u16 },

    /// Tag value points outside the block
    #[error("Value of tag 0x{tag:04x} out of bounds: {size} bytes at offset {offset}")]
    ValueOutOfBounds { tag: u16, offset: u32, size: u64 },

    /// Raw value length does not match its field type
    #[error("Invalid value length for tag 0x{tag:04x}: {len} bytes is not a multiple of {unit}")]
    InvalidValueLength { tag: u16, len: usize, unit: usize },

    /// Encoded block would not be addressable with 32-bit offsets
    #[error("Encoded EXIF block too large: {0} bytes")]
    EncodedTooLarge(usize),
}

/// Errors related to image container (JPEG segment / PNG chunk) structure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// Data does not start with the expected signature
    #[error("Missing {format} signature")]
    MissingSignature { format: &'static str },

    /// Data ended in the middle of a structure
    #[error("Truncated {format} data at offset {offset}")]
    Truncated { format: &'static str, offset: usize },

    /// A JPEG marker byte was expected but something else was found
    #[error("Invalid JPEG marker 0x{byte:02X} at offset {offset}")]
    InvalidMarker { byte: u8, offset: usize },

    /// A JPEG segment declared an impossible length
    #[error("Invalid JPEG segment length {length} at offset {offset}")]
    InvalidSegmentLength { length: u16, offset: usize },

    /// PNG chunk CRC did not match its contents
    #[error("CRC mismatch in PNG chunk {chunk}: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    CrcMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    /// Replacement payload does not fit into a single container unit
    #[error("EXIF payload of {size} bytes exceeds the {format} limit of {limit} bytes")]
    PayloadTooLarge {
        format: &'static str,
        size: usize,
        limit: usize,
    },

    /// Substitution was requested but the container holds no EXIF block
    #[error("No EXIF block to replace in {format} data")]
    NoExifBlock { format: &'static str },
}

/// Failure in either layer of the metadata stack
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// Container structure error
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// EXIF block error
    #[error(transparent)]
    Exif(#[from] ExifError),
}

/// Errors returned by the EXIF scrubber
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrubError {
    /// Neither JPEG nor PNG; callers usually pass the file through untouched
    #[error("Unsupported format: can't scrub EXIF for this file type")]
    UnsupportedFormat,

    /// Input bytes could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[source] MetadataError),

    /// A directory pointer whose child cannot be located unambiguously
    #[error(
        "Structural inconsistency in {ifd}: pointer tag 0x{tag_id:04x} at position {position} \
         matches {matches} child directories"
    )]
    StructuralInconsistency {
        ifd: String,
        tag_id: u16,
        position: usize,
        matches: usize,
    },

    /// Rebuilt metadata could not be written back
    #[error("Serialize error: {0}")]
    Serialize(#[source] MetadataError),
}

impl ScrubError {
    /// Wrap a parse-side failure.
    pub fn parse(err: impl Into<MetadataError>) -> Self {
        ScrubError::Parse(err.into())
    }

    /// Wrap a write-side failure.
    pub fn serialize(err: impl Into<MetadataError>) -> Self {
        ScrubError::Serialize(err.into())
    }
}

/// Errors from the upload service
#[derive(Debug, Error)]
pub enum UploadError {
    /// Request did not contain a usable file field
    #[error("Could not read uploaded file: {0}")]
    InvalidRequest(String),

    /// Uploaded body exceeded the configured size limit
    #[error("Upload too large: {0}")]
    TooLarge(String),

    /// Scrubbing failed and the configuration says to abort
    #[error("Could not scrub EXIF data: {0}")]
    Scrub(#[from] ScrubError),

    /// Writing the file to disk failed
    #[error("Could not save file: {0}")]
    Storage(#[from] std::io::Error),

    /// Every generated name was already taken
    #[error("Could not find a free file name after {attempts} attempts")]
    NoFreeName { attempts: usize },

    /// Blocking scrub task panicked or was cancelled
    #[error("Scrub task failed: {0}")]
    Task(String),
}

/// Errors from loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Key is not one of the known configuration keys
    #[error("Unexpected config key: \"{0}\"")]
    UnknownKey(String),

    /// Value could not be parsed for its key
    #[error("Invalid value for {key}: \"{value}\"")]
    InvalidValue { key: String, value: String },
}
