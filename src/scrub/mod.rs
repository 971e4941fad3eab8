//! EXIF scrubbing.
//!
//! # Pipeline
//!
//! ```text
//! bytes -> detect + parse container -> root Ifd -> rebuild (allow-list) -> IfdBuilder
//!       -> substitute + write container -> bytes
//! ```
//!
//! Files without EXIF are returned untouched. Files that are neither JPEG nor
//! PNG yield [`ScrubError::UnsupportedFormat`](crate::error::ScrubError), which
//! callers treat as "store as is".

mod allow;
mod rebuild;
mod scrubber;

pub use allow::AllowList;
pub use rebuild::{rebuild, RebuildStats};
pub use scrubber::ExifScrubber;
