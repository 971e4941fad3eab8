//! In-memory model of a parsed EXIF directory tree.
//!
//! A parsed block is a chain of root directories (IFD0 -> IFD1 -> ...), each of
//! which may own nested child directories reached through pointer tags. The
//! tree is fully owned, so a back-reference in the source bytes can never turn
//! into a cycle here; the parser rejects those up front.

use std::fmt;

use bytes::Bytes;

use super::parser::ByteOrder;
use super::tags::{self, FieldType};

// =============================================================================
// IfdIdentity
// =============================================================================

/// Identity of a directory: its unindexed path, its position in its chain,
/// and the pointer tag that led to it (none for the root chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IfdIdentity {
    path: &'static str,
    index: usize,
    parent_tag: Option<u16>,
}

impl IfdIdentity {
    /// Identity of IFD0.
    pub const fn root() -> Self {
        Self {
            path: tags::IFD_PATH_ROOT,
            index: 0,
            parent_tag: None,
        }
    }

    /// Identity of the first directory of a child chain.
    pub const fn child(path: &'static str, parent_tag: u16) -> Self {
        Self {
            path,
            index: 0,
            parent_tag: Some(parent_tag),
        }
    }

    /// Identity of the directory following this one in the same chain.
    pub const fn next_in_chain(self) -> Self {
        Self {
            path: self.path,
            index: self.index + 1,
            parent_tag: self.parent_tag,
        }
    }

    /// Unindexed path, e.g. `"IFD/GPSInfo"`. Tag paths are built from this.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Position within the chain (0 for the first directory).
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Pointer tag in the parent directory, if this is a child chain.
    #[inline]
    pub const fn parent_tag(&self) -> Option<u16> {
        self.parent_tag
    }
}

impl fmt::Display for IfdIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}{}", self.path, self.index)
        }
    }
}

// =============================================================================
// TagEntry
// =============================================================================

/// Payload of a tag entry: either a raw value or a pointer to a child directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    /// Raw value bytes, exactly `count * unit size` long, in the block's byte order
    Bytes(Bytes),

    /// Pointer to a nested directory
    ChildIfd(IfdIdentity),
}

/// A single entry of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Tag identifier
    pub tag_id: u16,

    /// Field type of the value
    pub field_type: FieldType,

    /// Number of values of `field_type`
    pub count: u32,

    /// Path of the directory owning this entry
    pub ifd_path: &'static str,

    /// Value or child pointer
    pub value: EntryValue,
}

impl TagEntry {
    /// Check whether this entry points to a nested directory.
    #[inline]
    pub fn is_child_pointer(&self) -> bool {
        matches!(self.value, EntryValue::ChildIfd(_))
    }

    /// Raw value bytes, or `None` for directory pointers.
    pub fn raw_bytes(&self) -> Option<&Bytes> {
        match &self.value {
            EntryValue::Bytes(bytes) => Some(bytes),
            EntryValue::ChildIfd(_) => None,
        }
    }

    /// Check whether this entry is a thumbnail offset/length marker.
    #[inline]
    pub fn is_thumbnail_marker(&self) -> bool {
        tags::is_thumbnail_marker(self.ifd_path, self.tag_id)
    }

    /// Standard name of the tag, if known.
    pub fn name(&self) -> Option<&'static str> {
        tags::tag_name(self.ifd_path, self.tag_id)
    }

    /// Fully qualified tag path, e.g. `"IFD/GPSInfo/GPSTimeStamp"`.
    pub fn path(&self) -> String {
        tags::tag_path(self.ifd_path, self.tag_id)
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed directory with its chain successor and nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Identity of this directory
    pub identity: IfdIdentity,

    /// Byte order of the block this directory was read from
    pub byte_order: ByteOrder,

    /// Offset of this directory within the TIFF block
    pub offset: u32,

    /// Entries in file order
    pub entries: Vec<TagEntry>,

    /// Directories reached through pointer entries of this directory
    pub children: Vec<Ifd>,

    /// Index into the parent's `entries` of the pointer that led here
    pub parent_entry_index: Option<usize>,

    /// Next directory in the same chain
    pub next: Option<Box<Ifd>>,
}

impl Ifd {
    /// Create an empty directory.
    pub fn new(identity: IfdIdentity, byte_order: ByteOrder, offset: u32) -> Self {
        Self {
            identity,
            byte_order,
            offset,
            entries: Vec::new(),
            children: Vec::new(),
            parent_entry_index: None,
            next: None,
        }
    }

    /// Iterate over this directory and all its chain successors.
    pub fn chain(&self) -> impl Iterator<Item = &Ifd> {
        std::iter::successors(Some(self), |ifd| ifd.next.as_deref())
    }

    /// Children recorded as belonging to the entry at `entry_index`.
    pub fn children_at(&self, entry_index: usize) -> impl Iterator<Item = &Ifd> {
        self.children
            .iter()
            .filter(move |child| child.parent_entry_index == Some(entry_index))
    }

    /// Find the first entry with the given tag id.
    pub fn find_entry(&self, tag_id: u16) -> Option<&TagEntry> {
        self.entries.iter().find(|entry| entry.tag_id == tag_id)
    }

    /// Find the first child directory with the given path.
    pub fn find_child(&self, path: &str) -> Option<&Ifd> {
        self.children
            .iter()
            .find(|child| child.identity.path() == path)
    }

    /// Visit every value entry of this chain and all nested chains.
    ///
    /// Pointer entries are not passed to the visitor; their target
    /// directories are descended into instead.
    pub fn visit_tags<F>(&self, visitor: &mut F)
    where
        F: FnMut(&Ifd, &TagEntry),
    {
        for ifd in self.chain() {
            for (index, entry) in ifd.entries.iter().enumerate() {
                if entry.is_child_pointer() {
                    for child in ifd.children_at(index) {
                        child.visit_tags(visitor);
                    }
                } else {
                    visitor(ifd, entry);
                }
            }
        }
    }

    /// Collect the paths of all value entries, in visiting order.
    pub fn tag_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.visit_tags(&mut |_, entry| paths.push(entry.path()));
        paths
    }
}

// =============================================================================
// Tests
// =============================================================================
