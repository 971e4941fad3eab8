// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// EXIF blocks can be either little-endian or big-endian, determined by the
// magic bytes at the start of the TIFF header. JPEG and PNG framing is always
// big-endian. These helpers are shared by the parsers and encoders.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a big-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Write a u16 in little-endian order into the first 2 bytes of `out`.
#[inline]
pub fn write_u16_le(out: &mut [u8], value: u16) {
    out[..2].copy_from_slice(&value.to_le_bytes());
}

/// Write a u16 in big-endian order into the first 2 bytes of `out`.
#[inline]
pub fn write_u16_be(out: &mut [u8], value: u16) {
    out[..2].copy_from_slice(&value.to_be_bytes());
}

/// Write a u32 in little-endian order into the first 4 bytes of `out`.
#[inline]
pub fn write_u32_le(out: &mut [u8], value: u32) {
    out[..4].copy_from_slice(&value.to_le_bytes());
}

/// Write a u32 in big-endian order into the first 4 bytes of `out`.
#[inline]
pub fn write_u32_be(out: &mut [u8], value: u32) {
    out[..4].copy_from_slice(&value.to_be_bytes());
}
