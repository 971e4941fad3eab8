//! Allow-list filter for EXIF tags.

use std::collections::HashSet;

use crate::exif::{tags, TagEntry};

/// Tags that survive scrubbing.
///
/// A tag is kept when its numeric id is listed (in any directory) or when its
/// fully qualified path, e.g. `"IFD/GPSInfo/GPSTimeStamp"`, is listed. Paths
/// match exactly; there are no wildcards or prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    ids: HashSet<u16>,
    paths: HashSet<String>,
}

impl AllowList {
    pub fn new<I, P, S>(ids: I, paths: P) -> Self
    where
        I: IntoIterator<Item = u16>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().collect(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Decide whether the tag `tag_id` in directory `ifd_path` is kept.
    pub fn is_allowed(&self, ifd_path: &str, tag_id: u16) -> bool {
        if self.ids.contains(&tag_id) {
            return true;
        }
        !self.paths.is_empty() && self.paths.contains(&tags::tag_path(ifd_path, tag_id))
    }

    /// Decide whether a parsed entry is kept.
    #[inline]
    pub fn allows(&self, entry: &TagEntry) -> bool {
        self.is_allowed(entry.ifd_path, entry.tag_id)
    }

    /// Check if nothing at all is allowed.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.paths.is_empty()
    }
}
