//! File extension detection for uploads.
//!
//! # Rules
//!
//! 1. If the client-supplied name has an extension, keep it. Only the last
//!    component is used (`foo.jpg.zip` -> `.zip`) unless the tail is a known
//!    combination (`foo.tar.gz` -> `.tar.gz`).
//! 2. If the name has no `.` at all, sniff the content by magic bytes.
//! 3. Text that is valid UTF-8 becomes `.txt`; unrecognized binary data gets no
//!    extension.
//!
//! Extensions are later appended to a file name inside the upload directory,
//! so anything that is not plain `[A-Za-z0-9._-]` is replaced by a sniffed one.

/// Multi-part extensions that are kept together.
const KNOWN_COMBINATIONS: &[&str] = &[".tar.gz", ".tar.xz"];

/// `(offset, magic bytes, extension)`, checked in order.
const MAGIC_TABLE: &[(usize, &[u8], &str)] = &[
    (0, &[0xFF, 0xD8, 0xFF], ".jpg"),
    (0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], ".png"),
    (0, b"GIF87a", ".gif"),
    (0, b"GIF89a", ".gif"),
    (8, b"WEBP", ".webp"),
    (8, b"WAVE", ".wav"),
    (0, b"%PDF-", ".pdf"),
    (0, b"PK\x03\x04", ".zip"),
    (0, &[0x1F, 0x8B], ".gz"),
    (0, &[0xFD, b'7', b'z', b'X', b'Z', 0x00], ".xz"),
    (0, b"BZh", ".bz2"),
    (0, &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C], ".7z"),
    (0, b"II*\0", ".tif"),
    (0, b"MM\0*", ".tif"),
    (4, b"ftyp", ".mp4"),
    (0, b"ID3", ".mp3"),
    (0, b"OggS", ".ogg"),
    (0, b"BM", ".bmp"),
];

/// Determine the extension (including the leading `.`) for an upload.
///
/// Returns an empty string when nothing fits.
pub fn build_file_extension(data: &[u8], name: &str) -> String {
    match extension_from_name(name) {
        Some(extension) if is_safe_extension(extension) => extension.to_string(),
        Some(_) | None => sniff_extension(data).unwrap_or_default().to_string(),
    }
}

/// Extract the extension from a file name, honouring known combinations.
fn extension_from_name(name: &str) -> Option<&str> {
    let mut current = name.rfind('.')?;

    while let Some(candidate) = name[..current].rfind('.') {
        let tail = &name[candidate..];
        if !KNOWN_COMBINATIONS.iter().any(|comb| comb.starts_with(tail)) {
            break;
        }
        current = candidate;
    }

    Some(&name[current..])
}

fn is_safe_extension(extension: &str) -> bool {
    extension.len() > 1
        && extension
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        && !extension.contains("..")
}

/// Guess an extension from the leading bytes of a file.
pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    let magic = MAGIC_TABLE.iter().find(|(offset, magic, _)| {
        data.len() >= offset + magic.len() && &data[*offset..offset + magic.len()] == *magic
    });
    if let Some((_, _, extension)) = magic {
        return Some(*extension);
    }

    if !data.contains(&0) && std::str::from_utf8(data).is_ok() {
        return Some(".txt");
    }

    None
}
